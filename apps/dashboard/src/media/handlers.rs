use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::media::service::{self, media_url, MediaItem};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TakeQuery {
    pub take: Option<i64>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

/// POST /api/v1/media
///
/// Expects a multipart form with a single `file` field.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        let id = service::store(&state.db, &file_name, &content_type, &data).await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "id": id, "url": media_url(id) })),
        ));
    }
    Err(AppError::Validation("Missing 'file' field in multipart form".into()))
}

/// GET /api/v1/media
pub async fn handle_list_media(
    State(state): State<AppState>,
    Query(params): Query<TakeQuery>,
) -> Result<Json<Vec<MediaItem>>, AppError> {
    let take = service::normalize_take(params.take);
    Ok(Json(service::latest(&state.db, take).await?))
}

/// GET /media/:id
pub async fn handle_serve_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let asset = service::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {id} not found")))?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.data))
}
