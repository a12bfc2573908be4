//! Cross-language combination editing.
//!
//! A "combination" is the view of one (group, key) pair across every
//! registered language: the editor screen where all values for a string are
//! shown and saved together. Reads return one entry per known language in
//! listing order; writes are applied per language and reported individually.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::{self, Database};

/// One language's slot in a combination; `value` is empty when the language
/// has no row for the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationEntry {
    pub language: String,
    pub value: String,
}

/// Per-language outcome report for a combination save.
///
/// Languages are applied independently; a failure in one does not roll back
/// the others. Callers inspect `failed` to decide whether to re-submit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombinationUpdate {
    pub written: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<CombinationFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinationFailure {
    pub language: String,
    pub error: String,
}

impl CombinationUpdate {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Editor over all language values of a (group, key) pair.
#[derive(Clone)]
pub struct CombinationEngine {
    db: Database,
}

impl CombinationEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns one entry per registered language, in language-listing order.
    /// Languages without a stored row get an empty value so editors always
    /// render a full grid.
    pub fn get(&self, group: &str, key: &str) -> Result<Vec<CombinationEntry>> {
        let group = validate_pair_segment("group", group)?;
        let key = validate_pair_segment("key", key)?;

        let codes = self.db.language_codes()?;
        let mut entries = Vec::with_capacity(codes.len());
        for code in codes {
            let value = self
                .db
                .find_translation(&group, &key, &code)?
                .map(|record| record.value)
                .unwrap_or_default();
            entries.push(CombinationEntry {
                language: code,
                value,
            });
        }
        Ok(entries)
    }

    /// Saves a combination: for each submitted language, an empty value
    /// deletes the row (idempotently) and a non-empty value upserts it.
    ///
    /// Group, key, and every language code are validated before any write.
    /// After that, languages are processed independently; partial failures
    /// are collected into the returned report rather than aborting the save.
    pub fn update(
        &self,
        group: &str,
        key: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<CombinationUpdate> {
        let group = store::validate_segment("group", group)?;
        let key = store::validate_segment("key", key)?;
        for language in values.keys() {
            store::validate_code(language)?;
        }

        let mut report = CombinationUpdate::default();
        for (language, value) in values {
            let outcome = if value.is_empty() {
                self.remove_value(&group, &key, language)
            } else {
                self.write_value(&group, &key, language, value)
            };

            match outcome {
                Ok(Applied::Written) => report.written.push(language.clone()),
                Ok(Applied::Removed) => report.removed.push(language.clone()),
                Ok(Applied::Noop) => {}
                Err(e) => {
                    warn!(
                        "Combination {}/{}: failed to apply '{}': {}",
                        group, key, language, e
                    );
                    report.failed.push(CombinationFailure {
                        language: language.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Deletes every language row for the pair. Removing a pair that does
    /// not exist is `NotFound`.
    pub fn delete(&self, group: &str, key: &str) -> Result<usize> {
        let group = validate_pair_segment("group", group)?;
        let key = validate_pair_segment("key", key)?;

        let deleted = self.db.delete_translations(&group, &key)?;
        if deleted == 0 {
            return Err(Error::not_found("translation", format!("{}/{}", group, key)));
        }
        info!(
            "Deleted combination {}/{} ({} language rows)",
            group, key, deleted
        );
        Ok(deleted)
    }

    fn write_value(&self, group: &str, key: &str, language: &str, value: &str) -> Result<Applied> {
        self.db.upsert_translation(group, key, language, value)?;
        Ok(Applied::Written)
    }

    fn remove_value(&self, group: &str, key: &str, language: &str) -> Result<Applied> {
        match self.db.delete_translation(group, key, language) {
            Ok(()) => Ok(Applied::Removed),
            // Clearing an already-absent slot is a no-op, not a failure
            Err(e) if e.is_not_found() => Ok(Applied::Noop),
            Err(e) => Err(e),
        }
    }
}

enum Applied {
    Written,
    Removed,
    Noop,
}

fn validate_pair_segment(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_engine() -> (CombinationEngine, Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");
        (CombinationEngine::new(db.clone()), db, temp_dir)
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(l, v)| (l.to_string(), v.to_string()))
            .collect()
    }

    // ==================== Get Tests ====================

    #[test]
    fn test_get_returns_entry_per_language_in_listing_order() {
        let (engine, db, _dir) = create_test_engine();
        db.create_language("Turkish", "tr").unwrap();
        db.create_language("English", "en").unwrap();
        db.create_translation("checkout", "pay_now", "en", "Pay now")
            .unwrap();

        let entries = engine.get("checkout", "pay_now").unwrap();

        // Listing order is name ascending: English before Turkish
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].language, "en");
        assert_eq!(entries[0].value, "Pay now");
        assert_eq!(entries[1].language, "tr");
        assert_eq!(entries[1].value, "");
    }

    #[test]
    fn test_get_with_no_languages_is_empty() {
        let (engine, _db, _dir) = create_test_engine();

        let entries = engine.get("checkout", "pay_now").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_get_ignores_translations_for_unregistered_languages() {
        let (engine, db, _dir) = create_test_engine();
        db.create_language("English", "en").unwrap();
        db.create_translation("checkout", "pay_now", "de", "Jetzt zahlen")
            .unwrap();

        let entries = engine.get("checkout", "pay_now").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].language, "en");
    }

    #[test]
    fn test_get_rejects_empty_group_or_key() {
        let (engine, _db, _dir) = create_test_engine();

        assert!(engine.get("", "pay_now").unwrap_err().is_validation());
        assert!(engine.get("checkout", "  ").unwrap_err().is_validation());
    }

    // ==================== Update Tests ====================

    #[test]
    fn test_update_writes_new_values() {
        let (engine, db, _dir) = create_test_engine();

        let report = engine
            .update(
                "checkout",
                "pay_now",
                &values(&[("en", "Pay now"), ("tr", "Şimdi öde")]),
            )
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.written, vec!["en", "tr"]);
        assert!(report.removed.is_empty());

        let en = db.find_translation("checkout", "pay_now", "en").unwrap();
        assert_eq!(en.unwrap().value, "Pay now");
    }

    #[test]
    fn test_update_replaces_existing_values() {
        let (engine, db, _dir) = create_test_engine();
        db.create_translation("checkout", "pay_now", "en", "Pay")
            .unwrap();

        let report = engine
            .update("checkout", "pay_now", &values(&[("en", "Pay now")]))
            .unwrap();

        assert_eq!(report.written, vec!["en"]);
        let record = db
            .find_translation("checkout", "pay_now", "en")
            .unwrap()
            .unwrap();
        assert_eq!(record.value, "Pay now");
    }

    #[test]
    fn test_update_empty_value_deletes_row() {
        let (engine, db, _dir) = create_test_engine();
        db.create_translation("checkout", "pay_now", "en", "Pay now")
            .unwrap();

        let report = engine
            .update("checkout", "pay_now", &values(&[("en", "")]))
            .unwrap();

        assert_eq!(report.removed, vec!["en"]);
        assert!(db
            .find_translation("checkout", "pay_now", "en")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_clearing_absent_slot_is_noop() {
        let (engine, _db, _dir) = create_test_engine();

        let report = engine
            .update("checkout", "pay_now", &values(&[("en", "")]))
            .unwrap();

        assert!(report.is_complete());
        assert!(report.written.is_empty());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_update_mixes_writes_and_removes() {
        let (engine, db, _dir) = create_test_engine();
        db.create_translation("checkout", "pay_now", "tr", "Şimdi öde")
            .unwrap();

        let report = engine
            .update(
                "checkout",
                "pay_now",
                &values(&[("en", "Pay now"), ("tr", "")]),
            )
            .unwrap();

        assert_eq!(report.written, vec!["en"]);
        assert_eq!(report.removed, vec!["tr"]);
        assert!(db
            .find_translation("checkout", "pay_now", "tr")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_validates_before_any_write() {
        let (engine, db, _dir) = create_test_engine();

        let err = engine
            .update(
                "checkout",
                "pay_now",
                &values(&[("en", "Pay now"), ("DEU", "Jetzt")]),
            )
            .unwrap_err();

        assert!(err.is_validation());
        // The valid language must not have been written either
        assert!(db
            .find_translation("checkout", "pay_now", "en")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_rejects_invalid_group_length() {
        let (engine, _db, _dir) = create_test_engine();

        let err = engine
            .update("ab", "pay_now", &values(&[("en", "Pay now")]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("group"));
    }

    #[test]
    fn test_update_empty_map_is_complete_noop() {
        let (engine, _db, _dir) = create_test_engine();

        let report = engine
            .update("checkout", "pay_now", &BTreeMap::new())
            .unwrap();
        assert!(report.is_complete());
        assert!(report.written.is_empty());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_update_trims_group_and_key() {
        let (engine, db, _dir) = create_test_engine();

        engine
            .update("  checkout ", " pay_now  ", &values(&[("en", "Pay now")]))
            .unwrap();

        assert!(db
            .find_translation("checkout", "pay_now", "en")
            .unwrap()
            .is_some());
    }

    // ==================== Delete Tests ====================

    #[test]
    fn test_delete_removes_all_language_rows() {
        let (engine, db, _dir) = create_test_engine();
        db.create_translation("checkout", "pay_now", "en", "Pay now")
            .unwrap();
        db.create_translation("checkout", "pay_now", "tr", "Şimdi öde")
            .unwrap();
        db.create_translation("checkout", "cancel", "en", "Cancel")
            .unwrap();

        let deleted = engine.delete("checkout", "pay_now").unwrap();
        assert_eq!(deleted, 2);

        // The other pair is untouched
        assert!(db
            .find_translation("checkout", "cancel", "en")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_delete_missing_pair_is_not_found() {
        let (engine, _db, _dir) = create_test_engine();

        let err = engine.delete("checkout", "pay_now").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("checkout/pay_now"));
    }

    #[test]
    fn test_delete_rejects_empty_inputs() {
        let (engine, _db, _dir) = create_test_engine();

        assert!(engine.delete("", "pay_now").unwrap_err().is_validation());
        assert!(engine.delete("checkout", "").unwrap_err().is_validation());
    }
}
