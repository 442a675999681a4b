use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct MediaAssetRow {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Listing projection without the payload bytes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MediaItemRow {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}
