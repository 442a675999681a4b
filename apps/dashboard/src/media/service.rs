use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::media::{MediaAssetRow, MediaItemRow};

pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_LIST_TAKE: i64 = 30;
pub const MAX_LIST_TAKE: i64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    #[serde(flatten)]
    pub item: MediaItemRow,
    pub url: String,
}

pub fn media_url(id: Uuid) -> String {
    format!("/media/{id}")
}

/// Images only, at most [`MAX_UPLOAD_BYTES`].
pub fn check_upload(content_type: &str, len: usize) -> Result<(), AppError> {
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(AppError::UnsupportedMediaType(format!(
            "expected an image, got '{content_type}'"
        )));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "file is {len} bytes, limit is {MAX_UPLOAD_BYTES}"
        )));
    }
    Ok(())
}

/// Non-positive values fall back to the default.
pub fn normalize_take(take: Option<i64>) -> i64 {
    match take {
        Some(t) if t > 0 => t.min(MAX_LIST_TAKE),
        _ => DEFAULT_LIST_TAKE,
    }
}

pub async fn store(pool: &PgPool, file_name: &str, content_type: &str, data: &[u8]) -> Result<Uuid, AppError> {
    check_upload(content_type, data.len())?;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO media_assets (id, file_name, content_type, data) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(file_name)
        .bind(content_type)
        .bind(data)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn latest(pool: &PgPool, take: i64) -> sqlx::Result<Vec<MediaItem>> {
    let rows = sqlx::query_as::<_, MediaItemRow>(
        r#"
        SELECT id, file_name, content_type, created_at FROM media_assets
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(take)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|item| MediaItem {
            url: media_url(item.id),
            item,
        })
        .collect())
}

pub async fn get(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<MediaAssetRow>> {
    sqlx::query_as::<_, MediaAssetRow>("SELECT * FROM media_assets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
