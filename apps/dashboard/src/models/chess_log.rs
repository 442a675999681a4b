use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChessLogRow {
    pub id: i64,
    pub logged_at: DateTime<Utc>,
    pub log_type: String,
    pub search_depth: i32,
    pub duration_ms: i64,
    pub legal_moves_count: i32,
    pub evaluated_moves_count: i32,
    pub best_move_uci: Option<String>,
    pub best_score_cp: Option<i32>,
    pub generated_moves_total: i64,
    pub nodes_visited: i64,
    pub leaf_evaluations: i64,
    pub evaluated_moves_json: Option<String>,
}
