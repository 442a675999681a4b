use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::articles::service::{self, ArticleFilter, ArticleInput, ArticleSort, ArticleWithLabels};
use crate::errors::AppError;
use crate::models::article::LabelRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListArticlesQuery {
    /// Comma-separated label ids, e.g. `labels=1,4`.
    pub labels: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ArticleSort,
    #[serde(default)]
    pub public_only: bool,
}

/// Unparseable ids are skipped rather than rejected.
fn parse_label_ids(raw: Option<&str>) -> Vec<i64> {
    raw.map(|s| s.split(',').filter_map(|p| p.trim().parse().ok()).collect())
        .unwrap_or_default()
}

/// GET /api/v1/articles
pub async fn handle_list_articles(
    State(state): State<AppState>,
    Query(params): Query<ListArticlesQuery>,
) -> Result<Json<Vec<ArticleWithLabels>>, AppError> {
    let filter = ArticleFilter {
        label_ids: parse_label_ids(params.labels.as_deref()),
        search: params.search,
        sort: params.sort,
        public_only: params.public_only,
    };
    Ok(Json(service::list_articles(&state.db, &filter).await?))
}

/// GET /api/v1/articles/:id
pub async fn handle_get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleWithLabels>, AppError> {
    service::get_article(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))
}

/// GET /api/v1/articles/slug/:slug
pub async fn handle_get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleWithLabels>, AppError> {
    service::get_public_by_slug(&state.db, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Article '{slug}' not found")))
}

/// POST /api/v1/articles
pub async fn handle_create_article(
    State(state): State<AppState>,
    Json(input): Json<ArticleInput>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let article = service::create_article(&state.db, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": article.id, "slug": article.slug })),
    ))
}

/// PUT /api/v1/articles/:id
pub async fn handle_update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ArticleInput>,
) -> Result<StatusCode, AppError> {
    if !service::update_article(&state.db, id, &input).await? {
        return Err(AppError::NotFound(format!("Article {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/articles/:id
pub async fn handle_delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !service::delete_article(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Article {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/labels
pub async fn handle_list_labels(State(state): State<AppState>) -> Result<Json<Vec<LabelRow>>, AppError> {
    Ok(Json(service::list_labels(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_ids_skips_garbage() {
        assert_eq!(parse_label_ids(Some("1, 2,x,,5")), vec![1, 2, 5]);
        assert!(parse_label_ids(None).is_empty());
    }
}
