//! Extension / content-type tables for the supported video and image formats.

/// Content type for a video file extension (lowercase, without dot).
pub fn video_content_type(extension: &str) -> &'static str {
    match extension {
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "flv" => "video/x-flv",
        _ => "video/mp4",
    }
}

/// Content type for an image file extension (lowercase, without dot).
pub fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Best-effort content type guess from a storage key, for backends that do
/// not persist one. Unknown extensions fall back to octet-stream.
pub fn guess_content_type(key: &str) -> &'static str {
    let extension = key.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "mp4" | "avi" | "mov" | "wmv" | "webm" | "mkv" | "flv" => {
            video_content_type(&extension)
        }
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => image_content_type(&extension),
        _ => "application/octet-stream",
    }
}

/// Lowercased extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
