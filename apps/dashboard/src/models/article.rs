use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub is_public: bool,
    pub cover_media_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LabelRow {
    pub id: i64,
    pub name: String,
}

/// Label attached to an article, as returned by the join query.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleLabelRow {
    pub article_id: i64,
    pub id: i64,
    pub name: String,
}

/// Trimmed projection used by the digest.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArticleSummaryRow {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
