use thiserror::Error;

/// Domain errors surfaced by the translation store.
///
/// `Store` wraps the raw database error for failures that are not a
/// constraint violation; duplicate writes are mapped to `Conflict` at the
/// write path so callers never have to inspect SQLite error codes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("duplicate {entity} {field} '{value}'")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{entity} not found: {identity}")]
    NotFound {
        entity: &'static str,
        identity: String,
    },

    #[error("translation provider error{}: {detail}", fmt_status(.status))]
    Upstream { status: Option<u16>, detail: String },

    #[error("storage error: {0}")]
    Store(#[from] rusqlite::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            field,
            value: value.into(),
        }
    }

    pub fn not_found(entity: &'static str, identity: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            identity: identity.into(),
        }
    }

    pub fn upstream(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
