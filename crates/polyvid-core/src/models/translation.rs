//! Translated-filename record, computed once at entity creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::language::Language;

/// Filesystem-safe translated titles per language. Written once when the
/// entity is created and read-only thereafter, so every later language
/// variant is named consistently with the first upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub filenames: BTreeMap<Language, String>,
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn new(filenames: BTreeMap<Language, String>) -> Self {
        Self {
            filenames,
            created_at: Utc::now(),
        }
    }

    /// Translated filename for a language, if recorded.
    pub fn filename_for(&self, language: Language) -> Option<&str> {
        self.filenames.get(&language).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_lookup() {
        let mut filenames = BTreeMap::new();
        filenames.insert(Language::Ko, "기초_안전교육".to_string());
        filenames.insert(Language::En, "Basic_Safety_Training".to_string());
        let record = TranslationRecord::new(filenames);

        assert_eq!(
            record.filename_for(Language::En),
            Some("Basic_Safety_Training")
        );
        assert_eq!(record.filename_for(Language::Ja), None);
    }
}
