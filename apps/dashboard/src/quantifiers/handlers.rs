use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::quantifiers::service::{self, QuantifierCard, DEFAULT_HISTORY_DAYS};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub user_id: Uuid,
    pub history_days: Option<u32>,
}

#[derive(Deserialize)]
pub struct CreateQuantifierRequest {
    pub user_id: Uuid,
    pub name: String,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    pub value: i32,
}

#[derive(Deserialize)]
pub struct EntryRequest {
    pub user_id: Uuid,
    pub date: Option<NaiveDate>,
    pub value: i32,
}

/// GET /api/v1/quantifiers
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<Vec<QuantifierCard>>, AppError> {
    let days = params.history_days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let today = Utc::now().date_naive();
    Ok(Json(service::dashboard(&state.db, params.user_id, today, days).await?))
}

/// POST /api/v1/quantifiers
pub async fn handle_create_quantifier(
    State(state): State<AppState>,
    Json(req): Json<CreateQuantifierRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let id = service::create_with_first_entry(&state.db, req.user_id, &req.name, date, req.value).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /api/v1/quantifiers/:id/entries
pub async fn handle_upsert_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EntryRequest>,
) -> Result<StatusCode, AppError> {
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    if !service::upsert_entry(&state.db, req.user_id, id, date, req.value).await? {
        return Err(AppError::NotFound(format!("Quantifier {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
