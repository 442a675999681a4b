pub mod health;
pub mod logs;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::articles::handlers as articles;
use crate::chess::handlers as chess;
use crate::digest::handlers as digest;
use crate::goals::handlers as goals;
use crate::media::{handlers as media, service::MAX_UPLOAD_BYTES};
use crate::portfolio;
use crate::quantifiers::handlers as quantifiers;
use crate::quiz::handlers as quiz;
use crate::state::AppState;
use crate::todos::handlers as todos;

/// Room for multipart framing on top of the file itself, so oversize files
/// reach the handler and get a proper 413 body.
const MEDIA_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/portfolio", get(portfolio::handle_portfolio))
        // Articles and labels
        .route(
            "/api/v1/articles",
            get(articles::handle_list_articles).post(articles::handle_create_article),
        )
        .route(
            "/api/v1/articles/:id",
            get(articles::handle_get_article)
                .put(articles::handle_update_article)
                .delete(articles::handle_delete_article),
        )
        .route("/api/v1/articles/slug/:slug", get(articles::handle_get_by_slug))
        .route(
            "/api/v1/articles/:id/questions",
            get(quiz::handle_questions_by_article),
        )
        .route("/api/v1/labels", get(articles::handle_list_labels))
        // Goals
        .route(
            "/api/v1/goals",
            get(goals::handle_list_goals).post(goals::handle_create_goal),
        )
        .route("/api/v1/goals/month", get(goals::handle_month_overview))
        .route(
            "/api/v1/goals/:id",
            get(goals::handle_get_goal)
                .put(goals::handle_update_goal)
                .delete(goals::handle_delete_goal),
        )
        .route("/api/v1/goals/:id/done", patch(goals::handle_toggle_done))
        .route("/api/v1/goals/:id/article", patch(goals::handle_update_article))
        // Todos
        .route(
            "/api/v1/todos",
            get(todos::handle_list_todos).post(todos::handle_create_todo),
        )
        .route(
            "/api/v1/todos/:id",
            get(todos::handle_get_todo)
                .put(todos::handle_update_todo)
                .delete(todos::handle_delete_todo),
        )
        .route("/api/v1/todos/:id/done", patch(todos::handle_toggle_todo))
        // Quiz bank
        .route(
            "/api/v1/quiz/questions",
            get(quiz::handle_list_questions).post(quiz::handle_create_question),
        )
        .route(
            "/api/v1/quiz/questions/:id",
            get(quiz::handle_get_question)
                .put(quiz::handle_update_question)
                .delete(quiz::handle_delete_question),
        )
        // Leitner review
        .route("/api/v1/review/sync", post(quiz::handle_sync_cards))
        .route("/api/v1/review/due", get(quiz::handle_get_due))
        .route("/api/v1/review/due/count", get(quiz::handle_due_count))
        .route("/api/v1/review/cards/:id", post(quiz::handle_record_review))
        // Quantifiers
        .route(
            "/api/v1/quantifiers",
            get(quantifiers::handle_dashboard).post(quantifiers::handle_create_quantifier),
        )
        .route(
            "/api/v1/quantifiers/:id/entries",
            put(quantifiers::handle_upsert_entry),
        )
        // Digest settings
        .route(
            "/api/v1/email-settings",
            get(digest::handle_get_settings).put(digest::handle_save_settings),
        )
        // Media library
        .route(
            "/api/v1/media",
            get(media::handle_list_media)
                .post(media::handle_upload)
                .layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT)),
        )
        .route("/media/:id", get(media::handle_serve_media))
        // Operator views
        .route("/api/v1/logs", get(logs::handle_recent_logs))
        // Anonymous chess engine telemetry
        .route(
            "/api/aichesslogs",
            get(chess::handle_recent).post(chess::handle_ingest),
        )
        .with_state(state)
}
