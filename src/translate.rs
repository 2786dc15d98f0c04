use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::language::LanguageTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub detected_source_language: LanguageTag,
    pub translated_text: String,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no translations returned")]
    Empty,

    #[error("malformed translation response: {0}")]
    Malformed(String),
}

/// A translation service. Dropping the returned future aborts the call.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        target: &LanguageTag,
        text: &str,
    ) -> Result<TranslationResult, TranslateError>;
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: [&'a str; 1],
    target: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
    detected_source_language: Option<String>,
}

/// Google Cloud Translation (v2 REST API) client
pub struct GoogleTranslator {
    client: reqwest::Client,
    config: TranslateConfig,
}

impl GoogleTranslator {
    pub fn new(config: TranslateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        target: &LanguageTag,
        text: &str,
    ) -> Result<TranslationResult, TranslateError> {
        let request = TranslateRequest {
            q: [text],
            target: target.to_string(),
        };

        debug!("Sending translation request to {}", self.config.base_url);

        let response = self
            .client
            .post(&self.config.base_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api { status, body });
        }

        let body: TranslateResponse = response.json().await?;
        let translation = body
            .data
            .translations
            .into_iter()
            .next()
            .ok_or(TranslateError::Empty)?;

        let detected = translation.detected_source_language.ok_or_else(|| {
            TranslateError::Malformed("missing detectedSourceLanguage".to_string())
        })?;
        let detected_source_language = LanguageTag::from_service(&detected)
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;

        Ok(TranslationResult {
            detected_source_language,
            translated_text: translation.translated_text,
        })
    }
}
