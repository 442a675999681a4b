use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::quiz::QuizQuestionRow;
use crate::quiz::bank::{self, QuestionInput};
use crate::quiz::cards::{self, DueItem, ReviewResult, DEFAULT_DUE_TAKE};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct DueQuery {
    pub user_id: Uuid,
    /// Reference date; defaults to today (UTC).
    pub on: Option<NaiveDate>,
    pub take: Option<i64>,
}

#[derive(Serialize)]
pub struct DueCountResponse {
    pub due: i64,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub user_id: Uuid,
    pub is_correct: bool,
}

fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// GET /api/v1/quiz/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizQuestionRow>>, AppError> {
    Ok(Json(bank::list_questions(&state.db).await?))
}

/// GET /api/v1/quiz/questions/:id
pub async fn handle_get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuizQuestionRow>, AppError> {
    bank::get_question(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Question {id} not found")))
}

/// POST /api/v1/quiz/questions
pub async fn handle_create_question(
    State(state): State<AppState>,
    Json(input): Json<QuestionInput>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = bank::create_question(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /api/v1/quiz/questions/:id
pub async fn handle_update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<QuestionInput>,
) -> Result<StatusCode, AppError> {
    if !bank::update_question(&state.db, id, &input).await? {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/quiz/questions/:id
pub async fn handle_delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !bank::delete_question(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/articles/:id/questions
pub async fn handle_questions_by_article(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
) -> Result<Json<Vec<QuizQuestionRow>>, AppError> {
    Ok(Json(bank::list_by_article(&state.db, article_id).await?))
}

/// POST /api/v1/review/sync
pub async fn handle_sync_cards(
    State(state): State<AppState>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<Value>, AppError> {
    let created = cards::sync_missing_cards(&state.db, req.user_id, today_utc()).await?;
    Ok(Json(json!({ "created": created })))
}

/// GET /api/v1/review/due
pub async fn handle_get_due(
    State(state): State<AppState>,
    Query(params): Query<DueQuery>,
) -> Result<Json<Vec<DueItem>>, AppError> {
    let on = params.on.unwrap_or_else(today_utc);
    let take = params.take.unwrap_or(DEFAULT_DUE_TAKE);
    Ok(Json(cards::get_due(&state.db, params.user_id, on, take).await?))
}

/// GET /api/v1/review/due/count
pub async fn handle_due_count(
    State(state): State<AppState>,
    Query(params): Query<DueQuery>,
) -> Result<Json<DueCountResponse>, AppError> {
    let on = params.on.unwrap_or_else(today_utc);
    let due = cards::get_due_count(&state.db, params.user_id, on).await?;
    Ok(Json(DueCountResponse { due }))
}

/// POST /api/v1/review/cards/:id
pub async fn handle_record_review(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResult>, AppError> {
    cards::record_review(&state.db, req.user_id, card_id, req.is_correct, today_utc())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Card {card_id} not found")))
}
