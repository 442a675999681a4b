use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub description: String,
    pub is_done: bool,
    pub done_at: Option<DateTime<Utc>>,
}
