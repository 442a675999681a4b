use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizQuestionRow {
    pub id: i64,
    pub question_text: String,
    pub choice0: String,
    pub choice1: String,
    pub choice2: String,
    pub choice3: String,
    pub correct_answer: i16,
    pub explanation: String,
    pub is_public: bool,
    pub article_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeitnerCardRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub question_id: i64,
    #[sqlx(rename = "box")]
    #[serde(rename = "box")]
    pub box_number: i32,
    pub next_due_date: NaiveDate,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only review history. Never read back into scheduling.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeitnerReviewRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub card_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub is_correct: bool,
    pub previous_box: i32,
    pub new_box: i32,
}
