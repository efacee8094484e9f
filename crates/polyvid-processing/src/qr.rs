//! Composite QR synthesis: watch-link QR code with an optional embedded
//! circular thumbnail and a caption band.
//!
//! Error correction is level H, so the center of the symbol tolerates the
//! thumbnail occlusion (~25% of the area) and stays scannable. Every
//! compositing step degrades to a bare QR code instead of failing the
//! upload; only an unencodable payload is an error.

use ab_glyph::{Font, FontVec};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut, text_size};
use polyvid_core::AppError;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use std::path::Path;

/// Final QR canvas edge in pixels.
const QR_SIZE: u32 = 360;
/// Embedded thumbnail edge: a quarter of the QR width.
const THUMB_SIZE: u32 = QR_SIZE / 4;
/// White backing ring around the thumbnail, preserving contrast against
/// the surrounding modules.
const RING_WIDTH: u32 = 8;
/// Caption band below the code.
const CAPTION_HEIGHT: u32 = 50;
const CAPTION_MARGIN: u32 = 8;
const CAPTION_SCALE: f32 = 20.0;
/// Caption byte budget before truncation.
const CAPTION_MAX_BYTES: usize = 64;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// QR image composer.
pub struct QrComposer {
    font: Option<FontVec>,
}

impl QrComposer {
    /// Build a composer; captions require a font file, without one they are
    /// skipped and the output is the bare (optionally thumbnailed) QR.
    pub fn new(caption_font_path: Option<&str>) -> Self {
        let font = caption_font_path.and_then(|path| match std::fs::read(Path::new(path)) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Caption font unusable, captions disabled");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Caption font unreadable, captions disabled");
                None
            }
        });
        Self { font }
    }

    /// Render the composite QR image for a watch URL.
    ///
    /// `title` becomes the caption (truncated; replaced by an id-derived
    /// ASCII string when the font cannot render it). `thumbnail` is masked
    /// to a circle and pasted over the center. Either extra may fail without
    /// failing the call.
    pub fn compose(
        &self,
        watch_url: &str,
        title: Option<&str>,
        thumbnail: Option<&[u8]>,
    ) -> Result<Vec<u8>, AppError> {
        let code = QrCode::with_error_correction_level(watch_url.as_bytes(), EcLevel::H)
            .map_err(|e| AppError::ImageProcessing(format!("QR encoding failed: {}", e)))?;

        let modules = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(6, 6)
            .build();

        // Nearest keeps module edges crisp for scanners
        let mut qr_image = DynamicImage::ImageLuma8(modules)
            .resize_exact(QR_SIZE, QR_SIZE, FilterType::Nearest)
            .to_rgba8();

        if let Some(bytes) = thumbnail {
            if let Err(e) = embed_thumbnail(&mut qr_image, bytes) {
                tracing::warn!(error = %e, "Thumbnail compositing failed, keeping bare QR");
            }
        }

        let final_image = match title.and_then(|t| self.prepare_caption(t, watch_url)) {
            Some(caption) => self.with_caption(qr_image, &caption),
            None => qr_image,
        };

        let mut out = Vec::new();
        DynamicImage::ImageRgba8(final_image)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| AppError::ImageProcessing(format!("PNG encoding failed: {}", e)))?;
        Ok(out)
    }

    /// Pick the caption text: the (truncated) title when the font can render
    /// it, an id-derived ASCII placeholder when it cannot, nothing when no
    /// font is configured.
    fn prepare_caption(&self, title: &str, watch_url: &str) -> Option<String> {
        let font = match &self.font {
            Some(font) => font,
            None => {
                tracing::debug!("No caption font configured, skipping caption");
                return None;
            }
        };

        let truncated = truncate_chars(title.trim(), CAPTION_MAX_BYTES);
        if truncated.is_empty() {
            return None;
        }

        let renderable = truncated
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| font.glyph_id(c).0 != 0);

        if renderable {
            Some(truncated.to_string())
        } else {
            Some(ascii_caption(watch_url))
        }
    }

    fn with_caption(&self, qr_image: RgbaImage, caption: &str) -> RgbaImage {
        let font = match &self.font {
            Some(font) => font,
            None => return qr_image,
        };

        let total_height = QR_SIZE + CAPTION_MARGIN + CAPTION_HEIGHT;
        let mut canvas = RgbaImage::from_pixel(QR_SIZE, total_height, WHITE);
        image::imageops::overlay(&mut canvas, &qr_image, 0, 0);

        let (text_width, _) = text_size(CAPTION_SCALE, font, caption);
        let x = ((QR_SIZE as i64 - text_width as i64) / 2).max(0) as i32;
        let y = (QR_SIZE + CAPTION_MARGIN) as i32;
        draw_text_mut(&mut canvas, BLACK, x, y, CAPTION_SCALE, font, caption);

        canvas
    }
}

/// Decode, resize, circularly mask, and paste the thumbnail over the QR
/// center on a white backing circle.
fn embed_thumbnail(qr_image: &mut RgbaImage, bytes: &[u8]) -> anyhow::Result<()> {
    let thumb = image::load_from_memory(bytes)?
        .resize_exact(THUMB_SIZE, THUMB_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let center = (QR_SIZE / 2) as i32;
    let ring_radius = ((THUMB_SIZE / 2) + RING_WIDTH) as i32;
    draw_filled_circle_mut(qr_image, (center, center), ring_radius, WHITE);

    let radius = THUMB_SIZE as f32 / 2.0;
    let offset = (QR_SIZE - THUMB_SIZE) / 2;
    for (x, y, pixel) in thumb.enumerate_pixels() {
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        if dx * dx + dy * dy <= radius * radius {
            qr_image.put_pixel(offset + x, offset + y, *pixel);
        }
    }

    Ok(())
}

/// ASCII placeholder caption derived from the watch URL's id segment.
fn ascii_caption(watch_url: &str) -> String {
    let id_segment = watch_url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let cleaned: String = id_segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(12)
        .collect::<String>()
        .to_uppercase();
    if cleaned.is_empty() {
        "QR".to_string()
    } else {
        cleaned
    }
}

/// Truncate to a byte budget without splitting a character.
fn truncate_chars(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    fn test_thumbnail() -> Vec<u8> {
        let img = RgbaImage::from_pixel(50, 50, Rgba([200, 30, 30, 255]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_bare_qr_renders() {
        let composer = QrComposer::new(None);
        let bytes = composer
            .compose("http://localhost:8080/watch/abc123", None, None)
            .unwrap();
        assert_eq!(png_dimensions(&bytes), (QR_SIZE, QR_SIZE));
    }

    #[test]
    fn test_thumbnail_is_composited() {
        let composer = QrComposer::new(None);
        let url = "http://localhost:8080/watch/abc123";
        let bare = composer.compose(url, None, None).unwrap();
        let with_thumb = composer
            .compose(url, None, Some(&test_thumbnail()))
            .unwrap();

        assert_eq!(png_dimensions(&with_thumb), (QR_SIZE, QR_SIZE));
        // Center pixel is now thumbnail red, not QR black/white
        let img = image::load_from_memory(&with_thumb).unwrap().to_rgba8();
        let center = img.get_pixel(QR_SIZE / 2, QR_SIZE / 2);
        assert_eq!(center, &Rgba([200, 30, 30, 255]));
        assert_ne!(bare, with_thumb);
    }

    #[test]
    fn test_corrupt_thumbnail_degrades_to_bare_qr() {
        let composer = QrComposer::new(None);
        let url = "http://localhost:8080/watch/abc123";
        let bytes = composer
            .compose(url, None, Some(b"definitely not an image"))
            .unwrap();
        assert_eq!(png_dimensions(&bytes), (QR_SIZE, QR_SIZE));
        assert_eq!(bytes, composer.compose(url, None, None).unwrap());
    }

    #[test]
    fn test_caption_without_font_is_skipped() {
        let composer = QrComposer::new(None);
        let long_title = "기초 용접 안전교육 ".repeat(20);
        let bytes = composer
            .compose(
                "http://localhost:8080/watch/abc123",
                Some(&long_title),
                None,
            )
            .unwrap();
        // No font configured: no caption band is added
        assert_eq!(png_dimensions(&bytes), (QR_SIZE, QR_SIZE));
    }

    #[test]
    fn test_missing_font_path_is_tolerated() {
        let composer = QrComposer::new(Some("/nonexistent/font.ttf"));
        let bytes = composer
            .compose("http://localhost:8080/watch/abc123", Some("title"), None)
            .unwrap();
        assert_eq!(png_dimensions(&bytes), (QR_SIZE, QR_SIZE));
    }

    #[test]
    fn test_ascii_caption_from_watch_url() {
        assert_eq!(
            ascii_caption("http://localhost:8080/watch/4f9b9c2a1e8d4b7f"),
            "4F9B9C2A1E8D"
        );
        assert_eq!(ascii_caption("///"), "QR");
    }

    #[test]
    fn test_truncate_chars_on_boundary() {
        let s = "안전교육안전교육안전교육안전교육안전교육안전교육안전교육";
        let t = truncate_chars(s, CAPTION_MAX_BYTES);
        assert!(t.len() <= CAPTION_MAX_BYTES);
        assert!(s.starts_with(t));
    }
}
