//! Polyvid Translation Library
//!
//! Title translation for multi-language lecture uploads. A remote backend is
//! used when a credential is configured; every failure path degrades to the
//! keyword-substitution fallback, so callers always receive a complete,
//! filename-safe map for all supported languages.

pub mod fallback;
pub mod remote;
pub mod sanitize;

pub use fallback::fallback_translation;
pub use remote::{RemoteTranslator, TranslateError};
pub use sanitize::make_filename_safe;

use lru::LruCache;
use polyvid_core::models::Language;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Successful translations kept keyed by source-text hash.
const CACHE_CAPACITY: usize = 256;

type TranslationMap = BTreeMap<Language, String>;

/// Title translator with remote backend, fallback tables, and a bounded
/// result cache.
pub struct Translator {
    remote: Option<RemoteTranslator>,
    cache: Mutex<LruCache<u64, TranslationMap>>,
}

impl Translator {
    /// Build a translator; without an API key it runs in fallback-only mode.
    pub fn new(api_key: Option<String>, endpoint: String) -> Self {
        let remote = match api_key {
            Some(key) => match RemoteTranslator::new(key, endpoint) {
                Ok(remote) => Some(remote),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote translator unavailable, using fallback only");
                    None
                }
            },
            None => {
                tracing::info!("No translation API key configured, using keyword fallback");
                None
            }
        };

        Self {
            remote,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("cache capacity is non-zero"),
            )),
        }
    }

    pub fn from_config(config: &polyvid_core::Config) -> Self {
        Self::new(
            config.translate_api_key.clone(),
            config.translate_endpoint.clone(),
        )
    }

    /// Whether a remote backend is configured (observability only).
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Translate a Korean title into every supported language.
    ///
    /// The returned map always contains all six languages, each value
    /// filename-safe, non-empty, and distinct from every other value.
    /// Remote failures degrade to the keyword fallback and are never
    /// surfaced to the caller.
    pub async fn translate_title(&self, source: &str) -> TranslationMap {
        let cache_key = source_hash(source);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&cache_key) {
                return hit.clone();
            }
        }

        let mut map = TranslationMap::new();
        map.insert(Language::Ko, make_filename_safe(source));

        for language in Language::TARGETS {
            let translated = match &self.remote {
                Some(remote) => match remote.translate(source, language).await {
                    Ok(candidate) if acceptable(source, &candidate) => {
                        Some(make_filename_safe(&candidate))
                    }
                    Ok(candidate) => {
                        tracing::debug!(
                            target_language = %language,
                            candidate = %candidate,
                            "Rejected echo-like translation, using fallback"
                        );
                        None
                    }
                    Err(e) => {
                        tracing::warn!(
                            target_language = %language,
                            error = %e,
                            "Translation degraded to fallback"
                        );
                        None
                    }
                },
                None => None,
            };

            let value =
                translated.unwrap_or_else(|| fallback_translation(source, language));
            map.insert(language, value);
        }

        deduplicate(&mut map);

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(cache_key, map.clone());
        }
        map
    }
}

fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// A usable remote result: non-empty, not the input, not a case-folded echo.
fn acceptable(source: &str, candidate: &str) -> bool {
    let trimmed = candidate.trim();
    !trimmed.is_empty()
        && trimmed != source
        && trimmed.to_lowercase() != source.to_lowercase()
}

/// Force pairwise-distinct values by suffixing any collision with its
/// language code. Collisions happen when keyword tables map different
/// languages onto the same word (e.g. 安全 in both zh and ja).
fn deduplicate(map: &mut TranslationMap) {
    let mut seen: HashSet<String> = HashSet::new();
    for language in Language::ALL {
        let Some(value) = map.get(&language).cloned() else {
            continue;
        };
        if seen.contains(&value) {
            let distinct = fallback::append_language_suffix(&value, language);
            seen.insert(distinct.clone());
            map.insert(language, distinct);
        } else {
            seen.insert(value);
        }
    }
}
