use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::audit;
use crate::errors::AppError;
use crate::models::log::LogRow;
use crate::state::AppState;

const DEFAULT_TAKE: i64 = 200;
const MAX_TAKE: i64 = 1000;

#[derive(Deserialize)]
pub struct TakeQuery {
    pub take: Option<i64>,
}

/// GET /api/v1/logs
/// Most recent audit rows, newest first.
pub async fn handle_recent_logs(
    State(state): State<AppState>,
    Query(params): Query<TakeQuery>,
) -> Result<Json<Vec<LogRow>>, AppError> {
    let take = params.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE);
    Ok(Json(audit::recent(&state.db, take).await?))
}
