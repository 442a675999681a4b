use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::audit::{self, Level};
use crate::chess::service::{self, ChessLogRequest, DEFAULT_RECENT_TAKE};
use crate::errors::AppError;
use crate::models::chess_log::ChessLogRow;
use crate::state::AppState;

const SOURCE: &str = "ChessLogIngest";

#[derive(Deserialize)]
pub struct TakeQuery {
    pub take: Option<i64>,
}

/// POST /api/aichesslogs
///
/// Anonymous. A JSON `null` body is rejected with 400.
pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(payload): Json<Option<ChessLogRequest>>,
) -> Result<impl IntoResponse, AppError> {
    audit::record(&state.db, Level::Info, SOURCE, "ApiCall", Some("POST /api/aichesslogs"), None).await;

    let Some(req) = payload else {
        audit::record(&state.db, Level::Warn, SOURCE, "BadRequest", Some("null payload"), None).await;
        return Err(AppError::Validation("payload must not be null".into()));
    };

    let id = match service::insert(&state.db, &req).await {
        Ok(id) => id,
        Err(e) => {
            let detail = e.to_string();
            audit::record(&state.db, Level::Error, SOURCE, "StoreFailed", None, Some(&detail)).await;
            return Err(e);
        }
    };

    let summary = req.summary(id);
    audit::record(&state.db, Level::Info, SOURCE, "Stored", Some(&summary), None).await;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/aichesslogs/{id}"))],
        Json(json!({ "id": id })),
    ))
}

/// GET /api/aichesslogs
pub async fn handle_recent(
    State(state): State<AppState>,
    Query(params): Query<TakeQuery>,
) -> Result<Json<Vec<ChessLogRow>>, AppError> {
    let take = params.take.unwrap_or(DEFAULT_RECENT_TAKE);
    Ok(Json(service::recent(&state.db, take).await?))
}
