//! Persistent operator log (`logs` table).
//!
//! Background work and the ingest endpoint leave a trail here in addition to
//! tracing output. Writing an audit row must never fail the caller.

use sqlx::PgPool;

use crate::models::log::LogRow;

const MESSAGE_MAX: usize = 2048;
const EXCEPTION_MAX: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
        }
    }
}

/// Inserts one audit row; failures are logged and swallowed.
pub async fn record(
    pool: &PgPool,
    level: Level,
    source: &str,
    event: &str,
    message: Option<&str>,
    exception: Option<&str>,
) {
    let result = sqlx::query(
        "INSERT INTO logs (level, source, event, message, exception) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(level.as_str())
    .bind(source)
    .bind(event)
    .bind(message.map(|m| truncate(m, MESSAGE_MAX)))
    .bind(exception.map(|e| truncate(e, EXCEPTION_MAX)))
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to write audit log {source}/{event}: {e}");
    }
}

/// Most recent audit rows, newest first.
pub async fn recent(pool: &PgPool, take: i64) -> sqlx::Result<Vec<LogRow>> {
    sqlx::query_as::<_, LogRow>("SELECT * FROM logs ORDER BY logged_at DESC, id DESC LIMIT $1")
        .bind(take)
        .fetch_all(pool)
        .await
}

/// Cuts `s` to at most `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_untouched() {
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // 'é' is two bytes; cutting at 2 would split it
        assert_eq!(truncate("aé", 2), "a");
        assert_eq!(truncate("aéb", 3), "aé");
    }
}
