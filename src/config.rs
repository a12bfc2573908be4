use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,

    // DeepL
    pub deepl_api_key: String,
    pub deepl_api_url: String,

    // Locale resolution
    pub default_locale: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Storage
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/translations.db".to_string()),

            // DeepL - required, the seeding path has no fallback provider
            deepl_api_key: std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY not set")?,
            deepl_api_url: std::env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| "https://api-free.deepl.com/v2/translate".to_string()),

            // Locale resolution
            default_locale: std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),
        })
    }
}
