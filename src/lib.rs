//! Multi-tenant translation store.
//!
//! A library for managing localized strings organized as (group, key, language)
//! triples, with a registry of supported languages, request-scoped locale
//! resolution, cross-language combination editing, and an adapter for seeding
//! translations through the DeepL machine-translation API.

pub mod combination;
pub mod config;
pub mod deepl;
pub mod error;
pub mod locale;
pub mod retry;
pub mod service;
pub mod store;

pub use combination::{CombinationEngine, CombinationEntry, CombinationFailure, CombinationUpdate};
pub use config::Config;
pub use deepl::DeepLClient;
pub use error::{Error, Result};
pub use service::TranslationService;
pub use store::{
    Database, LanguageRecord, TranslationGroup, TranslationRecord, TranslationStats,
};
