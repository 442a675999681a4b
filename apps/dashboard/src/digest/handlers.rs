use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::digest::settings::{self, EmailSettingsInput};
use crate::errors::AppError;
use crate::models::email_settings::EmailSettingsRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SettingsQuery {
    pub user_id: Uuid,
    /// Recipient proposed when the user has no saved settings yet.
    #[serde(default)]
    pub default_recipient: String,
}

#[derive(Deserialize)]
pub struct SaveSettingsRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub settings: EmailSettingsInput,
}

/// GET /api/v1/email-settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
    Query(params): Query<SettingsQuery>,
) -> Result<Json<EmailSettingsRow>, AppError> {
    let row = settings::get_or_default(&state.db, params.user_id, &params.default_recipient).await?;
    Ok(Json(row))
}

/// PUT /api/v1/email-settings
pub async fn handle_save_settings(
    State(state): State<AppState>,
    Json(req): Json<SaveSettingsRequest>,
) -> Result<Json<EmailSettingsRow>, AppError> {
    let row = settings::save(&state.db, req.user_id, req.settings).await?;
    Ok(Json(row))
}
