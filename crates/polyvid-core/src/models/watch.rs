//! Watch-time variant resolution with language fallback.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity::Entity;
use super::language::Language;

/// Outcome of resolving which stored variant to serve for a watch request.
///
/// `has_requested_language` is false whenever a fallback occurred, so callers
/// can surface "not yet available in your language".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WatchResolution {
    pub actual_language: Language,
    pub video_url: String,
    pub has_requested_language: bool,
}

impl Entity {
    /// Resolve the variant to serve for `requested`.
    ///
    /// An unsupported or absent requested code collapses to the original
    /// upload language. A missing variant falls back to the original, then
    /// to any variant with a usable URL. Absence of the requested language
    /// is expressed in the return value, never as an error; `None` only
    /// means the entity has no servable variant at all.
    pub fn resolve_watch(&self, requested: Option<Language>) -> Option<WatchResolution> {
        let default_language = self
            .original_variant()
            .map(|v| v.language)
            .unwrap_or(Language::Ko);
        let requested = requested.unwrap_or(default_language);

        if let Some(variant) = self.variants.get(&requested) {
            if !variant.video.url.is_empty() {
                return Some(WatchResolution {
                    actual_language: requested,
                    video_url: variant.video.url.clone(),
                    has_requested_language: true,
                });
            }
        }

        let fallback = self
            .original_variant()
            .filter(|v| !v.video.url.is_empty())
            .or_else(|| self.variants.values().find(|v| !v.video.url.is_empty()))?;

        Some(WatchResolution {
            actual_language: fallback.language,
            video_url: fallback.video.url.clone(),
            has_requested_language: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::entity::{LanguageVariant, StorageRef, VideoTechMetadata};
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn variant(language: Language, is_original: bool, url: &str) -> LanguageVariant {
        LanguageVariant {
            language,
            video: StorageRef {
                key: format!("videos/x/{}.mp4", language),
                url: url.to_string(),
            },
            content_type: "video/mp4".to_string(),
            metadata: VideoTechMetadata::zeroed(0),
            is_original,
            uploaded_at: Utc::now(),
        }
    }

    fn entity(variants: Vec<LanguageVariant>) -> Entity {
        let now = Utc::now();
        Entity {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            category_path: String::new(),
            base_folder: "videos/x".to_string(),
            watch_link: "http://localhost:8080/watch/x".to_string(),
            qr: None,
            thumbnail: None,
            variants: variants
                .into_iter()
                .map(|v| (v.language, v))
                .collect::<BTreeMap<_, _>>(),
            tags: vec![],
            total_file_size: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_requested_language_present() {
        let e = entity(vec![
            variant(Language::Ko, true, "http://p/video/ko"),
            variant(Language::En, false, "http://p/video/en"),
        ]);
        let res = e.resolve_watch(Some(Language::En)).unwrap();
        assert_eq!(res.actual_language, Language::En);
        assert_eq!(res.video_url, "http://p/video/en");
        assert!(res.has_requested_language);
    }

    #[test]
    fn test_missing_language_falls_back_to_original() {
        let e = entity(vec![variant(Language::Ko, true, "http://p/video/ko")]);
        let res = e.resolve_watch(Some(Language::En)).unwrap();
        assert_eq!(res.actual_language, Language::Ko);
        assert!(!res.has_requested_language);
    }

    #[test]
    fn test_unsupported_code_behaves_like_original_language() {
        // API callers map unknown codes ("fr") to None before resolving.
        let e = entity(vec![
            variant(Language::Ko, true, "http://p/video/ko"),
            variant(Language::En, false, "http://p/video/en"),
        ]);
        let unknown = e.resolve_watch(None).unwrap();
        let korean = e.resolve_watch(Some(Language::Ko)).unwrap();
        assert_eq!(unknown, korean);
        assert!(unknown.has_requested_language);
    }

    #[test]
    fn test_empty_url_variant_is_skipped() {
        let e = entity(vec![
            variant(Language::Ko, true, ""),
            variant(Language::Ja, false, "http://p/video/ja"),
        ]);
        let res = e.resolve_watch(Some(Language::Ko)).unwrap();
        assert_eq!(res.actual_language, Language::Ja);
        assert!(!res.has_requested_language);
    }

    #[test]
    fn test_no_servable_variant() {
        let e = entity(vec![variant(Language::Ko, true, "")]);
        assert!(e.resolve_watch(Some(Language::Ko)).is_none());
    }
}
