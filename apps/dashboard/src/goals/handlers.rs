use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::goals::coverage::{calendar_rows, month_bounds, monthly_coverage_map, CalendarCell};
use crate::goals::service::{self, GoalInput};
use crate::models::goal::GoalRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateGoalRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub goal: GoalInput,
}

#[derive(Deserialize)]
pub struct ArticleLinkRequest {
    pub user_id: Uuid,
    pub article_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub user_id: Uuid,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Serialize)]
pub struct MonthOverviewResponse {
    pub year: i32,
    pub month: u32,
    pub coverage: BTreeMap<NaiveDate, bool>,
    pub calendar: Vec<Vec<Option<CalendarCell>>>,
    pub goals: Vec<GoalRow>,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Goal {id} not found"))
}

/// GET /api/v1/goals
pub async fn handle_list_goals(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<GoalRow>>, AppError> {
    Ok(Json(service::list_goals(&state.db, params.user_id).await?))
}

/// GET /api/v1/goals/:id
pub async fn handle_get_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GoalRow>, AppError> {
    service::get_goal(&state.db, id, params.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /api/v1/goals
pub async fn handle_create_goal(
    State(state): State<AppState>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = service::create_goal(&state.db, req.user_id, &req.goal).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /api/v1/goals/:id
pub async fn handle_update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<StatusCode, AppError> {
    if !service::update_goal(&state.db, id, req.user_id, &req.goal).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/goals/:id/done
pub async fn handle_toggle_done(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if !service::toggle_done(&state.db, id, req.user_id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/goals/:id/article
pub async fn handle_update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ArticleLinkRequest>,
) -> Result<StatusCode, AppError> {
    if !service::update_article(&state.db, id, req.user_id, req.article_id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/goals/:id
pub async fn handle_delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if !service::delete_goal(&state.db, id, params.user_id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/goals/month
///
/// Coverage map, calendar grid and the goals overlapping the month.
/// Defaults to the current local month.
pub async fn handle_month_overview(
    State(state): State<AppState>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<MonthOverviewResponse>, AppError> {
    let now = Local::now().date_naive();
    let year = params.year.unwrap_or(now.year());
    let month = params.month.unwrap_or(now.month());
    let (first, last) = month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("invalid month {year}-{month}")))?;

    let goals = service::list_goals_overlapping(&state.db, params.user_id, first, last).await?;
    let coverage = monthly_coverage_map(&goals, first, last);
    let calendar = calendar_rows(first, last, &coverage);

    Ok(Json(MonthOverviewResponse {
        year,
        month,
        coverage,
        calendar,
        goals,
    }))
}
