//! Translation lookup and listing.
//!
//! `TranslationService` is the read-side entry point: single-string lookup
//! with key fallback, reverse lookup by value, whole-locale exports, and the
//! grouped listing used by management UIs.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::locale;
use crate::store::{Database, TranslationGroup, TranslationRecord, TranslationStats};

/// Read-side facade over the translation store.
#[derive(Clone)]
pub struct TranslationService {
    db: Database,
}

impl TranslationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Looks up a single string for `(group, key)` in the given locale.
    ///
    /// When `locale` is `None` the ambient locale from [`locale::current`]
    /// is used. A missing row, or a row holding an empty value, falls back
    /// to the key itself; lookup never fails for an unseeded string.
    pub fn translate(&self, group: &str, key: &str, locale: Option<&str>) -> Result<String> {
        let group = group.trim();
        let key = key.trim();
        if group.is_empty() {
            return Err(Error::validation("group", "must not be empty"));
        }
        if key.is_empty() {
            return Err(Error::validation("key", "must not be empty"));
        }

        let locale = resolve_locale(locale);

        match self.db.find_translation(group, key, &locale)? {
            Some(record) if !record.value.is_empty() => Ok(record.value),
            _ => {
                debug!(
                    "No translation for {}/{} in '{}', falling back to key",
                    group, key, locale
                );
                Ok(key.to_string())
            }
        }
    }

    /// Reverse lookup: finds the translation whose value contains
    /// `value_pattern` (case-insensitive) within a group and locale.
    ///
    /// Returns `None` when nothing matches; there is no key fallback here.
    pub fn translate_group_key(
        &self,
        group: &str,
        value_pattern: &str,
        locale: Option<&str>,
    ) -> Result<Option<TranslationRecord>> {
        let group = group.trim();
        let value_pattern = value_pattern.trim();
        if group.is_empty() {
            return Err(Error::validation("group", "must not be empty"));
        }
        if value_pattern.is_empty() {
            return Err(Error::validation("value", "must not be empty"));
        }

        let locale = resolve_locale(locale);
        self.db.find_by_value(group, value_pattern, &locale)
    }

    /// Returns every stored translation for one locale.
    ///
    /// A locale with no rows at all is reported as `NotFound` so callers can
    /// distinguish "never seeded" from "seeded but empty group".
    pub fn translate_application(&self, locale: &str) -> Result<Vec<TranslationRecord>> {
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(Error::validation("locale", "must not be empty"));
        }

        let records = self.db.translations_for_locale(locale)?;
        if records.is_empty() {
            return Err(Error::not_found("translations", locale));
        }
        Ok(records)
    }

    /// Reshapes the flat per-locale list into nested `group -> key -> value`
    /// maps, ready to serialize as a client bundle.
    pub fn application_bundle(
        &self,
        locale: &str,
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
        let records = self.translate_application(locale)?;

        let mut bundle: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for record in records {
            bundle
                .entry(record.group)
                .or_default()
                .insert(record.key, record.value);
        }
        Ok(bundle)
    }

    /// Grouped listing of distinct (group, key) pairs with the language codes
    /// that hold a row, paginated and optionally filtered.
    pub fn list(
        &self,
        skip: u32,
        take: u32,
        search: Option<&str>,
    ) -> Result<(Vec<TranslationGroup>, i64)> {
        self.db.list_translation_groups(skip, take, search)
    }

    pub fn stats(&self) -> Result<TranslationStats> {
        self.db.stats()
    }
}

fn resolve_locale(locale: Option<&str>) -> String {
    match locale.map(str::trim).filter(|l| !l.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => locale::current(),
    }
}
