//! Supported lecture languages.
//!
//! The set is fixed: Korean is the default upload language, the other five
//! are translation targets. Language codes double as metadata-store document
//! ids and as suffixes in storage keys, so the enum serializes to its
//! lowercase code.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
    Zh,
    Vi,
    Th,
    Ja,
}

impl Language {
    /// All supported languages, default language first.
    pub const ALL: [Language; 6] = [
        Language::Ko,
        Language::En,
        Language::Zh,
        Language::Vi,
        Language::Th,
        Language::Ja,
    ];

    /// Translation target languages (everything except the Korean original).
    pub const TARGETS: [Language; 5] = [
        Language::En,
        Language::Zh,
        Language::Vi,
        Language::Th,
        Language::Ja,
    ];

    /// Lowercase ISO 639-1 code, used in keys and document ids.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Zh => "zh",
            Language::Vi => "vi",
            Language::Th => "th",
            Language::Ja => "ja",
        }
    }

    /// Native display name, e.g. for listing endpoints.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::Ko => "한국어",
            Language::En => "English",
            Language::Zh => "中文",
            Language::Vi => "Tiếng Việt",
            Language::Th => "ไทย",
            Language::Ja => "日本語",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" => Ok(Language::Ko),
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            "vi" => Ok(Language::Vi),
            "th" => Ok(Language::Th),
            "ja" => Ok(Language::Ja),
            other => Err(format!("Unsupported language code: {}", other)),
        }
    }
}
