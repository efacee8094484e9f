//! Remote translation backend client.
//!
//! Speaks the translate-v2 wire shape: form-encoded POST, JSON response with
//! `data.translations[0].translatedText`. Absence of a configured API key is
//! a supported state handled one level up.

use polyvid_core::models::Language;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Translation request failed: {0}")]
    Request(String),

    #[error("Unexpected translation response: {0}")]
    Response(String),

    #[error("Translation client setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// HTTP client for the remote translation service.
#[derive(Debug, Clone)]
pub struct RemoteTranslator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl RemoteTranslator {
    pub fn new(api_key: String, endpoint: String) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TranslateError::Setup(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    /// Translate `text` from Korean into `target`, retrying with increasing
    /// backoff. Errors after the final attempt; never loops unbounded.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.request(text, target).await {
                Ok(translated) if !translated.trim().is_empty() => return Ok(translated),
                Ok(_) => {
                    last_error = Some(TranslateError::Response("empty translation".to_string()));
                }
                Err(e) => {
                    tracing::warn!(
                        target_language = %target,
                        attempt,
                        error = %e,
                        "Translation attempt failed"
                    );
                    last_error = Some(e);
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(BACKOFF_BASE * attempt).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| TranslateError::Request("retries exhausted".to_string())))
    }

    async fn request(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        let params = [
            ("key", self.api_key.as_str()),
            ("q", text),
            ("source", Language::Ko.code()),
            ("target", target.code()),
            ("format", "text"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Response(e.to_string()))?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| TranslateError::Response("no translations in response".to_string()))
    }
}
