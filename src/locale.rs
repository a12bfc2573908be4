//! Request-scoped locale propagation.
//!
//! A locale is bound to a scope of async work with [`scope`]; any code running
//! inside that scope (including spawned-in-place futures, but not detached
//! tasks) can read it back with [`current`]. Outside any scope, or when the
//! bound value is blank, [`current`] falls back to [`DEFAULT_LOCALE`].

use std::future::Future;

pub const DEFAULT_LOCALE: &str = "en";

tokio::task_local! {
    static LOCALE: String;
}

/// Runs `f` with `locale` bound as the ambient locale.
///
/// Blank or whitespace-only locales are normalized to [`DEFAULT_LOCALE`]
/// before binding, so `current()` never observes an empty value.
pub async fn scope<F>(locale: &str, f: F) -> F::Output
where
    F: Future,
{
    let locale = normalize(locale);
    LOCALE.scope(locale, f).await
}

/// Returns the locale bound by the nearest enclosing [`scope`], or
/// [`DEFAULT_LOCALE`] when called outside one. Never fails.
pub fn current() -> String {
    LOCALE
        .try_with(|locale| locale.clone())
        .unwrap_or_else(|_| DEFAULT_LOCALE.to_string())
}

fn normalize(locale: &str) -> String {
    let trimmed = locale.trim();
    if trimmed.is_empty() {
        DEFAULT_LOCALE.to_string()
    } else {
        trimmed.to_string()
    }
}
