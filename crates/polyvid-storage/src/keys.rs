//! Deterministic storage key derivation.
//!
//! Derivation is pure: identical inputs always yield identical keys, so a
//! retried upload overwrites its previous object instead of duplicating it.
//! Titles are sanitized before they become path segments.

use chrono::{DateTime, Datelike, Utc};
use polyvid_core::models::Language;
use uuid::Uuid;

/// Maximum characters kept from a sanitized title segment.
const MAX_TITLE_SEGMENT_CHARS: usize = 50;

/// Asset role tag embedded in object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Video,
    Thumbnail,
    QrCombined,
}

impl AssetRole {
    pub fn tag(&self) -> &'static str {
        match self {
            AssetRole::Video => "video",
            AssetRole::Thumbnail => "thumbnail",
            AssetRole::QrCombined => "qr_combined",
        }
    }
}

/// Sanitize a title for use as a single path segment.
///
/// Keeps alphanumerics in any script plus `-`; everything else becomes `_`.
/// Runs of `_` collapse, edges are trimmed, length is capped, and the result
/// is never empty. `..` cannot survive this mapping, so sanitized segments
/// cannot traverse.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_underscore = false;

    for c in title.chars().take(MAX_TITLE_SEGMENT_CHARS * 2) {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }

    let trimmed: String = out
        .trim_matches('_')
        .chars()
        .take(MAX_TITLE_SEGMENT_CHARS)
        .collect();
    let trimmed = trimmed.trim_end_matches('_').to_string();

    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

/// Base storage folder for an entity: `videos/{yyyy}/{mm}/{id}_{safe_title}`.
///
/// Fixed at creation time; every later language variant writes under it.
pub fn derive_base_folder(entity_id: Uuid, created_at: DateTime<Utc>, title: &str) -> String {
    format!(
        "videos/{:04}/{:02}/{}_{}",
        created_at.year(),
        created_at.month(),
        entity_id.simple(),
        sanitize_title(title)
    )
}

/// Object key for one asset under a base folder.
///
/// `language` is only meaningful for video assets; QR and thumbnail assets
/// are shared across languages.
pub fn derive_object_key(
    base_folder: &str,
    translated_name: &str,
    role: AssetRole,
    language: Option<Language>,
    extension: &str,
) -> String {
    let name = sanitize_title(translated_name);
    let ext = extension.trim_start_matches('.').to_lowercase();
    match language {
        Some(lang) => format!("{}/{}_{}_{}.{}", base_folder, name, role.tag(), lang, ext),
        None => format!("{}/{}_{}.{}", base_folder, name, role.tag(), ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_base_folder_is_deterministic() {
        let id = Uuid::parse_str("4f9b9c2a1e8d4b7fa3c2d1e0f9a8b7c6").unwrap();
        let a = derive_base_folder(id, ts(), "기초 용접 안전교육");
        let b = derive_base_folder(id, ts(), "기초 용접 안전교육");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "videos/2025/08/4f9b9c2a1e8d4b7fa3c2d1e0f9a8b7c6_기초_용접_안전교육"
        );
    }

    #[test]
    fn test_object_key_for_video_includes_language() {
        let key = derive_object_key(
            "videos/2025/08/abc_title",
            "Basic_Safety_Training",
            AssetRole::Video,
            Some(Language::En),
            "mp4",
        );
        assert_eq!(
            key,
            "videos/2025/08/abc_title/Basic_Safety_Training_video_en.mp4"
        );
    }

    #[test]
    fn test_object_key_for_qr_has_no_language() {
        let key = derive_object_key(
            "videos/2025/08/abc_title",
            "제목",
            AssetRole::QrCombined,
            None,
            "png",
        );
        assert_eq!(key, "videos/2025/08/abc_title/제목_qr_combined.png");
    }

    #[test]
    fn test_sanitize_strips_path_traversal() {
        assert_eq!(sanitize_title("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_title("a/b\\c"), "a_b_c");
        assert!(!sanitize_title("..").contains(".."));
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_controls() {
        assert_eq!(sanitize_title("hello   world\t\n!"), "hello_world");
        assert_eq!(sanitize_title("  기초   안전 "), "기초_안전");
    }

    #[test]
    fn test_sanitize_never_empty() {
        assert_eq!(sanitize_title(""), "untitled");
        assert_eq!(sanitize_title("///???***"), "untitled");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "가".repeat(400);
        assert!(sanitize_title(&long).chars().count() <= 50);
    }

    #[test]
    fn test_extension_normalized() {
        let key = derive_object_key("base", "n", AssetRole::Thumbnail, None, ".JPG");
        assert!(key.ends_with("n_thumbnail.jpg"));
    }
}
