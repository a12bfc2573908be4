//! DeepL machine-translation adapter.
//!
//! Used to seed translations for a new language from an existing one. Wire
//! errors are surfaced as `Error::Upstream` carrying the HTTP status where
//! one was received; only 429, 5xx and network failures are retried.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::{self, Database, TranslationRecord};

#[derive(Debug, Serialize)]
struct TranslateRequest {
    text: Vec<String>,
    // DeepL expects uppercase language codes on the wire
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    text: String,
}

pub struct DeepLClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl DeepLClient {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            reqwest::Client::new(),
            config.deepl_api_url.clone(),
            config.deepl_api_key.clone(),
        )
    }

    /// Override the retry policy (shorter delays in tests).
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Translates a single string into `target_lang`, letting DeepL detect
    /// the source language unless one is given.
    pub async fn translate_text(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::validation("text", "must not be empty"));
        }
        if target_lang.trim().is_empty() {
            return Err(Error::validation("target_lang", "must not be empty"));
        }

        with_retry_if(
            &self.retry,
            "deepl.translate",
            move || self.request_translation(text, source_lang, target_lang),
            is_retryable,
        )
        .await
    }

    async fn request_translation(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String> {
        let request = TranslateRequest {
            text: vec![text.to_string()],
            target_lang: target_lang.trim().to_uppercase(),
            source_lang: source_lang.map(|s| s.trim().to_uppercase()),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(None, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(Some(status.as_u16()), body));
        }

        let translated: TranslateResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(None, format!("invalid response body: {}", e)))?;

        translated
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| Error::upstream(None, "response contained no translations"))
    }

    /// Translates `value` and stores the result as a new translation row for
    /// `(group, key, target)`.
    ///
    /// Goes through the strict create path, so seeding a triple that already
    /// exists fails with the same `Conflict` a manual create would produce.
    pub async fn translate_into(
        &self,
        db: &Database,
        group: &str,
        key: &str,
        value: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<TranslationRecord> {
        if value.trim().is_empty() {
            return Err(Error::validation("value", "must not be empty"));
        }
        let target_code = store::validate_code(&target.trim().to_lowercase())?;

        let translated = self.translate_text(value, source, target).await?;
        let record = db.create_translation(group, key, &target_code, &translated)?;
        info!(
            "Seeded translation {}/{} into '{}' via DeepL",
            record.group, record.key, record.language
        );
        Ok(record)
    }
}

fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Upstream { status, .. } => match status {
            Some(code) => *code == 429 || *code >= 500,
            // No status means the request never completed (network failure)
            None => true,
        },
        _ => false,
    }
}
