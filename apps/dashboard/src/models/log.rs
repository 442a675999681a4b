use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogRow {
    pub id: i64,
    pub logged_at: DateTime<Utc>,
    pub level: String,
    pub source: String,
    pub event: Option<String>,
    pub message: Option<String>,
    pub exception: Option<String>,
}
