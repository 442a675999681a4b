//! Per-user Leitner review state.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::quiz::{LeitnerCardRow, LeitnerReviewRow, QuizQuestionRow};
use crate::quiz::leitner::{apply_review, missing_question_ids, BoxTransition, INITIAL_BOX};

pub const DEFAULT_DUE_TAKE: i64 = 50;
pub const MAX_DUE_TAKE: i64 = 500;

/// A due card together with its question.
#[derive(Debug, Clone, Serialize)]
pub struct DueItem {
    pub card_id: i64,
    #[serde(rename = "box")]
    pub box_number: i32,
    pub next_due_date: NaiveDate,
    pub question: QuizQuestionRow,
}

#[derive(FromRow)]
struct DueJoinRow {
    card_id: i64,
    #[sqlx(rename = "box")]
    box_number: i32,
    next_due_date: NaiveDate,
    #[sqlx(flatten)]
    question: QuizQuestionRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResult {
    pub is_correct: bool,
    #[serde(flatten)]
    pub transition: BoxTransition,
    /// History row appended for this review.
    pub review: LeitnerReviewRow,
}

/// Ensures the user has a card for every question in the bank.
/// Only ever inserts (box 1, due `today`); returns how many cards were created.
pub async fn sync_missing_cards(pool: &PgPool, owner_id: Uuid, today: NaiveDate) -> sqlx::Result<u64> {
    let all_question_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM quiz_questions ORDER BY id")
        .fetch_all(pool)
        .await?;

    let existing: Vec<i64> =
        sqlx::query_scalar("SELECT question_id FROM leitner_cards WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(pool)
            .await?;

    let missing = missing_question_ids(&all_question_ids, &existing);
    if missing.is_empty() {
        return Ok(0);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO leitner_cards (owner_id, question_id, box, next_due_date)
        SELECT $1, question_id, $3, $4
        FROM UNNEST($2::bigint[]) AS question_id
        ON CONFLICT (owner_id, question_id) DO NOTHING
        "#,
    )
    .bind(owner_id)
    .bind(&missing)
    .bind(INITIAL_BOX)
    .bind(today)
    .execute(pool)
    .await?
    .rows_affected();

    info!("Created {inserted} Leitner card(s) for user {owner_id}");
    Ok(inserted)
}

/// Cards due on or before `due_on_or_before`, lowest box and most overdue first.
pub async fn get_due(
    pool: &PgPool,
    owner_id: Uuid,
    due_on_or_before: NaiveDate,
    take: i64,
) -> sqlx::Result<Vec<DueItem>> {
    let rows = sqlx::query_as::<_, DueJoinRow>(
        r#"
        SELECT c.id AS card_id, c.box, c.next_due_date, q.*
        FROM leitner_cards c
        JOIN quiz_questions q ON q.id = c.question_id
        WHERE c.owner_id = $1 AND c.next_due_date <= $2
        ORDER BY c.box ASC, c.next_due_date ASC, c.id ASC
        LIMIT $3
        "#,
    )
    .bind(owner_id)
    .bind(due_on_or_before)
    .bind(take.clamp(1, MAX_DUE_TAKE))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| DueItem {
            card_id: r.card_id,
            box_number: r.box_number,
            next_due_date: r.next_due_date,
            question: r.question,
        })
        .collect())
}

pub async fn get_due_count<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    due_on_or_before: NaiveDate,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM leitner_cards WHERE owner_id = $1 AND next_due_date <= $2",
    )
    .bind(owner_id)
    .bind(due_on_or_before)
    .fetch_one(executor)
    .await
}

/// Records one review of `card_id` for `owner_id`.
///
/// Returns `None` when the card does not exist or belongs to another user;
/// both cases look the same to the caller.
pub async fn record_review(
    pool: &PgPool,
    owner_id: Uuid,
    card_id: i64,
    is_correct: bool,
    today: NaiveDate,
) -> sqlx::Result<Option<ReviewResult>> {
    let mut tx = pool.begin().await?;

    let card = sqlx::query_as::<_, LeitnerCardRow>(
        "SELECT * FROM leitner_cards WHERE id = $1 AND owner_id = $2 FOR UPDATE",
    )
    .bind(card_id)
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(card) = card else {
        return Ok(None);
    };

    let transition = apply_review(card.box_number, is_correct, today);

    sqlx::query(
        r#"
        UPDATE leitner_cards
        SET box = $1, next_due_date = $2, last_reviewed_at = now(), updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(transition.new_box)
    .bind(transition.next_due_date)
    .bind(card.id)
    .execute(&mut *tx)
    .await?;

    let review = sqlx::query_as::<_, LeitnerReviewRow>(
        r#"
        INSERT INTO leitner_reviews (owner_id, card_id, is_correct, previous_box, new_box)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(card.owner_id)
    .bind(card.id)
    .bind(is_correct)
    .bind(transition.previous_box)
    .bind(transition.new_box)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(ReviewResult {
        is_correct,
        transition,
        review,
    }))
}
