use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::todo::TodoRow;
use crate::state::AppState;
use crate::todos::service;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct TodoRequest {
    pub user_id: Uuid,
    pub description: String,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Todo {id} not found"))
}

/// GET /api/v1/todos
pub async fn handle_list_todos(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<TodoRow>>, AppError> {
    Ok(Json(service::list_todos(&state.db, params.user_id).await?))
}

/// GET /api/v1/todos/:id
pub async fn handle_get_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TodoRow>, AppError> {
    service::get_todo(&state.db, id, params.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /api/v1/todos
pub async fn handle_create_todo(
    State(state): State<AppState>,
    Json(req): Json<TodoRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = service::create_todo(&state.db, req.user_id, &req.description).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /api/v1/todos/:id
pub async fn handle_update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TodoRequest>,
) -> Result<StatusCode, AppError> {
    if !service::update_description(&state.db, id, req.user_id, &req.description).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/todos/:id/done
pub async fn handle_toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<TodoRow>, AppError> {
    service::toggle_done(&state.db, id, req.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /api/v1/todos/:id
pub async fn handle_delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if !service::delete_todo(&state.db, id, params.user_id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
