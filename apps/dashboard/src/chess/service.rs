use serde::Deserialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::chess_log::ChessLogRow;

pub const DEFAULT_LOG_TYPE: &str = "information";
pub const DEFAULT_RECENT_TAKE: i64 = 200;
pub const MAX_RECENT_TAKE: i64 = 500;
const LOG_TYPE_MAX: usize = 32;
const BEST_MOVE_MAX: usize = 16;

/// Search telemetry posted by the chess engine after each move search.
/// Field names follow the engine's camelCase payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChessLogRequest {
    #[serde(rename = "type")]
    pub log_type: Option<String>,
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

impl ChessLogRequest {
    /// Trimmed type, falling back to `information` when absent or blank.
    pub fn effective_type(&self) -> &str {
        self.log_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_LOG_TYPE)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.effective_type().chars().count() > LOG_TYPE_MAX {
            return Err(AppError::Validation(format!(
                "type must be at most {LOG_TYPE_MAX} characters"
            )));
        }
        if self
            .best_move_uci
            .as_deref()
            .is_some_and(|m| m.chars().count() > BEST_MOVE_MAX)
        {
            return Err(AppError::Validation(format!(
                "bestMoveUci must be at most {BEST_MOVE_MAX} characters"
            )));
        }
        Ok(())
    }

    /// One-line summary for the audit log.
    pub fn summary(&self, id: i64) -> String {
        format!(
            "Log Id={id}; Depth={}; DurMs={}; Legal={}; Eval={}; GenTotal={}; Nodes={}; Leafs={}; Best={}; Score={}",
            self.search_depth,
            self.duration_ms,
            self.legal_moves_count,
            self.evaluated_moves_count,
            self.generated_moves_total,
            self.nodes_visited,
            self.leaf_evaluations,
            self.best_move_uci.as_deref().unwrap_or(""),
            self.best_score_cp.map(|s| s.to_string()).unwrap_or_default(),
        )
    }
}

/// Stores the entry as sent; the timestamp is assigned by the database.
pub async fn insert(pool: &PgPool, req: &ChessLogRequest) -> Result<i64, AppError> {
    req.validate()?;
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO chess_logs
            (log_type, search_depth, duration_ms, legal_moves_count, evaluated_moves_count,
             best_move_uci, best_score_cp, generated_moves_total, nodes_visited,
             leaf_evaluations, evaluated_moves_json)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(req.effective_type())
    .bind(req.search_depth)
    .bind(req.duration_ms)
    .bind(req.legal_moves_count)
    .bind(req.evaluated_moves_count)
    .bind(req.best_move_uci.as_deref())
    .bind(req.best_score_cp)
    .bind(req.generated_moves_total)
    .bind(req.nodes_visited)
    .bind(req.leaf_evaluations)
    .bind(req.evaluated_moves_json.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn recent(pool: &PgPool, take: i64) -> sqlx::Result<Vec<ChessLogRow>> {
    sqlx::query_as::<_, ChessLogRow>("SELECT * FROM chess_logs ORDER BY logged_at DESC, id DESC LIMIT $1")
        .bind(take.clamp(1, MAX_RECENT_TAKE))
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_payload() {
        let req: ChessLogRequest = serde_json::from_str(
            r#"{"type":" warning ","searchDepth":4,"durationMs":120,"bestMoveUci":"e2e4","bestScoreCp":35}"#,
        )
        .unwrap();
        assert_eq!(req.effective_type(), "warning");
        assert_eq!(req.search_depth, 4);
        assert_eq!(req.best_move_uci.as_deref(), Some("e2e4"));
        assert_eq!(req.nodes_visited, 0);
    }

    #[test]
    fn test_type_defaults_to_information() {
        let req: ChessLogRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.effective_type(), "information");

        let blank = ChessLogRequest {
            log_type: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.effective_type(), "information");
    }

    #[test]
    fn test_overlong_type_rejected() {
        let req = ChessLogRequest {
            log_type: Some("x".repeat(33)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_summary_mentions_best_move() {
        let req = ChessLogRequest {
            best_move_uci: Some("g1f3".into()),
            best_score_cp: Some(-12),
            ..Default::default()
        };
        let s = req.summary(9);
        assert!(s.starts_with("Log Id=9;"));
        assert!(s.contains("Best=g1f3; Score=-12"));
    }
}
