use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub group: String,
    pub key: String,
    pub language: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A (group, key) pair with the language codes that have a row for it.
/// Summary view only, values are not carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationGroup {
    pub group: String,
    pub key: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationStats {
    pub total_translations: i64,
    pub total_groups: i64,
    pub total_keys: i64,
    pub language_distribution: BTreeMap<String, i64>,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Initialize database connection and create tables
    pub fn new(database_path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;

        // "group" is a reserved word in SQL, the column is named grp
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                code TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_languages_code
                ON languages(code);
            CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                grp TEXT NOT NULL,
                key TEXT NOT NULL,
                language TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_grp_key_language
                ON translations(grp, key, language);",
        )
        .context("Failed to create schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ==================== Languages ====================

    /// Register a new language. Fails with `Conflict` when the code is taken.
    pub fn create_language(&self, name: &str, code: &str) -> Result<LanguageRecord> {
        let name = validate_name(name)?;
        let code = validate_code(code)?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        match conn.execute(
            "INSERT INTO languages (name, code, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, code, now],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::conflict("language", "code", code));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(LanguageRecord {
            id: conn.last_insert_rowid(),
            name,
            code,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn language(&self, id: i64) -> Result<LanguageRecord> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT id, name, code, created_at, updated_at FROM languages WHERE id = ?1",
                params![id],
                row_to_language,
            )
            .optional()?;

        record.ok_or_else(|| Error::not_found("language", id.to_string()))
    }

    /// Update name and code of an existing language.
    pub fn update_language(&self, id: i64, name: &str, code: &str) -> Result<LanguageRecord> {
        let name = validate_name(name)?;
        let code = validate_code(code)?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let rows = match conn.execute(
            "UPDATE languages SET name = ?1, code = ?2, updated_at = ?3 WHERE id = ?4",
            params![name, code, now, id],
        ) {
            Ok(rows) => rows,
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::conflict("language", "code", code));
            }
            Err(e) => return Err(e.into()),
        };

        if rows == 0 {
            return Err(Error::not_found("language", id.to_string()));
        }

        let record = conn
            .query_row(
                "SELECT id, name, code, created_at, updated_at FROM languages WHERE id = ?1",
                params![id],
                row_to_language,
            )
            .optional()?;
        record.ok_or_else(|| Error::not_found("language", id.to_string()))
    }

    pub fn delete_language(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM languages WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::not_found("language", id.to_string()));
        }
        Ok(())
    }

    /// List languages with pagination and optional case-insensitive search
    /// over name and code. Ordering is name ascending with code as tiebreak,
    /// so pages are stable across calls.
    pub fn list_languages(
        &self,
        skip: u32,
        take: u32,
        search: Option<&str>,
    ) -> Result<(Vec<LanguageRecord>, i64)> {
        if take == 0 {
            return Err(Error::validation("take", "must be greater than zero"));
        }
        let pattern = like_pattern(search);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, code, created_at, updated_at FROM languages
             WHERE name LIKE ?1 OR code LIKE ?1
             ORDER BY name ASC, code ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let languages = stmt
            .query_map(params![pattern, take, skip], row_to_language)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM languages WHERE name LIKE ?1 OR code LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        Ok((languages, total))
    }

    /// All language codes in listing order (name ascending, code as tiebreak).
    pub fn language_codes(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT code FROM languages ORDER BY name ASC, code ASC")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(codes)
    }

    // ==================== Translations ====================

    /// Strict create: fails with `Conflict` when the (group, key, language)
    /// triple already exists. Uniqueness is enforced by the index alone, so
    /// concurrent creators race safely.
    pub fn create_translation(
        &self,
        group: &str,
        key: &str,
        language: &str,
        value: &str,
    ) -> Result<TranslationRecord> {
        let group = validate_segment("group", group)?;
        let key = validate_segment("key", key)?;
        let language = validate_code(language)?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        match conn.execute(
            "INSERT INTO translations (grp, key, language, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![group, key, language, value, now],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::conflict(
                    "translation",
                    "group/key/language",
                    format!("{}/{}/{}", group, key, language),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(TranslationRecord {
            id: conn.last_insert_rowid(),
            group,
            key,
            language,
            value: value.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Create-or-replace in a single statement. The write is atomic at the
    /// database level, so a concurrent reader sees either the old row or the
    /// new one, never an intermediate state.
    pub fn upsert_translation(
        &self,
        group: &str,
        key: &str,
        language: &str,
        value: &str,
    ) -> Result<TranslationRecord> {
        let group = validate_segment("group", group)?;
        let key = validate_segment("key", key)?;
        let language = validate_code(language)?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO translations (grp, key, language, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(grp, key, language)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![group, key, language, value, now],
        )?;

        let record = query_translation(&conn, &group, &key, &language)?;
        record.ok_or_else(|| {
            Error::not_found(
                "translation",
                format!("{}/{}/{}", group, key, language),
            )
        })
    }

    pub fn find_translation(
        &self,
        group: &str,
        key: &str,
        language: &str,
    ) -> Result<Option<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        Ok(query_translation(&conn, group, key, language)?)
    }

    /// All rows for one language, the raw material for an application bundle.
    pub fn translations_for_locale(&self, language: &str) -> Result<Vec<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, grp, key, language, value, created_at, updated_at
             FROM translations WHERE language = ?1
             ORDER BY grp ASC, key ASC",
        )?;
        let rows = stmt
            .query_map(params![language], row_to_translation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All rows for one (group, key) pair across languages.
    pub fn translations_for_key(&self, group: &str, key: &str) -> Result<Vec<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, grp, key, language, value, created_at, updated_at
             FROM translations WHERE grp = ?1 AND key = ?2
             ORDER BY language ASC",
        )?;
        let rows = stmt
            .query_map(params![group, key], row_to_translation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Reverse lookup: first row in a group whose value contains the pattern,
    /// case-insensitively, for the given language.
    pub fn find_by_value(
        &self,
        group: &str,
        value_pattern: &str,
        language: &str,
    ) -> Result<Option<TranslationRecord>> {
        let pattern = format!("%{}%", value_pattern);
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT id, grp, key, language, value, created_at, updated_at
                 FROM translations
                 WHERE grp = ?1 AND language = ?2 AND value LIKE ?3
                 ORDER BY key ASC
                 LIMIT 1",
                params![group, language, pattern],
                row_to_translation,
            )
            .optional()?;
        Ok(record)
    }

    pub fn delete_translation(&self, group: &str, key: &str, language: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM translations WHERE grp = ?1 AND key = ?2 AND language = ?3",
            params![group, key, language],
        )?;
        if rows == 0 {
            return Err(Error::not_found(
                "translation",
                format!("{}/{}/{}", group, key, language),
            ));
        }
        Ok(())
    }

    /// Delete every language row for one (group, key) pair.
    /// Returns the number of rows removed; zero is not an error here.
    pub fn delete_translations(&self, group: &str, key: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM translations WHERE grp = ?1 AND key = ?2",
            params![group, key],
        )?;
        Ok(rows)
    }

    /// Page through distinct (group, key) pairs, each carrying its language
    /// rows. Search matches group or key as a case-insensitive substring.
    /// The total counts distinct pairs, not rows.
    pub fn list_translation_groups(
        &self,
        skip: u32,
        take: u32,
        search: Option<&str>,
    ) -> Result<(Vec<TranslationGroup>, i64)> {
        if take == 0 {
            return Err(Error::validation("take", "must be greater than zero"));
        }
        let pattern = like_pattern(search);

        let conn = self.conn.lock().unwrap();
        let mut pair_stmt = conn.prepare(
            "SELECT grp, key FROM translations
             WHERE grp LIKE ?1 OR key LIKE ?1
             GROUP BY grp, key
             ORDER BY grp ASC, key ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let pairs = pair_stmt
            .query_map(params![pattern, take, skip], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut lang_stmt = conn.prepare(
            "SELECT language FROM translations
             WHERE grp = ?1 AND key = ?2
             ORDER BY language ASC",
        )?;
        let mut groups = Vec::with_capacity(pairs.len());
        for (group, key) in pairs {
            let languages = lang_stmt
                .query_map(params![group, key], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            groups.push(TranslationGroup {
                group,
                key,
                languages,
            });
        }

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (
                SELECT DISTINCT grp, key FROM translations
                WHERE grp LIKE ?1 OR key LIKE ?1
            )",
            params![pattern],
            |row| row.get(0),
        )?;

        Ok((groups, total))
    }

    pub fn count_translations(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Aggregate counts over the whole table, including how many rows each
    /// language holds. Useful for spotting codes that no registered language
    /// references anymore.
    pub fn stats(&self) -> Result<TranslationStats> {
        let conn = self.conn.lock().unwrap();

        let (total_translations, total_groups, total_keys): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT grp), COUNT(DISTINCT key) FROM translations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt =
            conn.prepare("SELECT language, COUNT(*) FROM translations GROUP BY language")?;
        let language_distribution = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        Ok(TranslationStats {
            total_translations,
            total_groups,
            total_keys,
            language_distribution,
        })
    }
}

fn row_to_language(row: &Row<'_>) -> rusqlite::Result<LanguageRecord> {
    Ok(LanguageRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn row_to_translation(row: &Row<'_>) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        group: row.get(1)?,
        key: row.get(2)?,
        language: row.get(3)?,
        value: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_translation(
    conn: &Connection,
    group: &str,
    key: &str,
    language: &str,
) -> rusqlite::Result<Option<TranslationRecord>> {
    conn.query_row(
        "SELECT id, grp, key, language, value, created_at, updated_at
         FROM translations WHERE grp = ?1 AND key = ?2 AND language = ?3",
        params![group, key, language],
        row_to_translation,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn like_pattern(search: Option<&str>) -> String {
    format!("%{}%", search.unwrap_or("").trim())
}

/// Language name: 2-30 characters after trimming.
fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    let len = name.chars().count();
    if !(2..=30).contains(&len) {
        return Err(Error::validation(
            "name",
            "must be between 2 and 30 characters",
        ));
    }
    Ok(name.to_string())
}

/// Language code: exactly 2 lowercase ASCII letters.
pub(crate) fn validate_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(Error::validation(
            "code",
            "must be exactly 2 lowercase letters",
        ));
    }
    Ok(code.to_string())
}

/// Group and key segments: 3-50 characters after trimming.
pub(crate) fn validate_segment(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    let len = value.chars().count();
    if !(3..=50).contains(&len) {
        return Err(Error::validation(
            field,
            "must be between 3 and 50 characters",
        ));
    }
    Ok(value.to_string())
}
