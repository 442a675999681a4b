use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::goal::GoalRow;

const TITLE_MAX: usize = 160;
const DESCRIPTION_MAX: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct GoalInput {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub article_id: Option<i64>,
    /// Only honoured on update; new goals always start open.
    pub is_done: Option<bool>,
}

impl GoalInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title cannot be empty".into()));
        }
        if title.chars().count() > TITLE_MAX {
            return Err(AppError::Validation(format!(
                "title must be at most {TITLE_MAX} characters"
            )));
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > DESCRIPTION_MAX)
        {
            return Err(AppError::Validation(format!(
                "description must be at most {DESCRIPTION_MAX} characters"
            )));
        }
        if self.end_date < self.start_date {
            return Err(AppError::Validation(
                "end_date must be on or after start_date".into(),
            ));
        }
        Ok(())
    }
}

pub async fn list_goals(pool: &PgPool, owner_id: Uuid) -> sqlx::Result<Vec<GoalRow>> {
    sqlx::query_as::<_, GoalRow>("SELECT * FROM goals WHERE owner_id = $1 ORDER BY start_date, id")
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

/// Goals whose period intersects `[first, last]`.
pub async fn list_goals_overlapping(
    pool: &PgPool,
    owner_id: Uuid,
    first: NaiveDate,
    last: NaiveDate,
) -> sqlx::Result<Vec<GoalRow>> {
    sqlx::query_as::<_, GoalRow>(
        r#"
        SELECT * FROM goals
        WHERE owner_id = $1 AND end_date >= $2 AND start_date <= $3
        ORDER BY start_date, id
        "#,
    )
    .bind(owner_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await
}

/// Open goals whose period contains `today`.
pub async fn open_goals_covering<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    today: NaiveDate,
) -> sqlx::Result<Vec<GoalRow>> {
    sqlx::query_as::<_, GoalRow>(
        r#"
        SELECT * FROM goals
        WHERE owner_id = $1 AND start_date <= $2 AND end_date >= $2 AND NOT is_done
        ORDER BY start_date, id
        "#,
    )
    .bind(owner_id)
    .bind(today)
    .fetch_all(executor)
    .await
}

pub async fn get_goal(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<Option<GoalRow>> {
    sqlx::query_as::<_, GoalRow>("SELECT * FROM goals WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_goal(pool: &PgPool, owner_id: Uuid, input: &GoalInput) -> Result<i64, AppError> {
    input.validate()?;
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO goals (owner_id, title, description, start_date, end_date, article_id, is_done)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(input.title.trim())
    .bind(input.description.as_deref())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.article_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Full edit. Leaves `is_done` alone when the input omits it.
pub async fn update_goal(
    pool: &PgPool,
    id: i64,
    owner_id: Uuid,
    input: &GoalInput,
) -> Result<bool, AppError> {
    input.validate()?;
    let affected = sqlx::query(
        r#"
        UPDATE goals
        SET title = $1, description = $2, start_date = $3, end_date = $4,
            article_id = $5, is_done = COALESCE($6, is_done)
        WHERE id = $7 AND owner_id = $8
        "#,
    )
    .bind(input.title.trim())
    .bind(input.description.as_deref())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.article_id)
    .bind(input.is_done)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

pub async fn toggle_done(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<bool> {
    let affected = sqlx::query("UPDATE goals SET is_done = NOT is_done WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn update_article(
    pool: &PgPool,
    id: i64,
    owner_id: Uuid,
    article_id: Option<i64>,
) -> sqlx::Result<bool> {
    let affected = sqlx::query("UPDATE goals SET article_id = $1 WHERE id = $2 AND owner_id = $3")
        .bind(article_id)
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn delete_goal(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<bool> {
    let affected = sqlx::query("DELETE FROM goals WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(start: (i32, u32, u32), end: (i32, u32, u32)) -> GoalInput {
        GoalInput {
            title: "Read the Rust book".into(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            article_id: None,
            is_done: None,
        }
    }

    #[test]
    fn test_single_day_goal_valid() {
        assert!(input((2026, 1, 5), (2026, 1, 5)).validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = input((2026, 1, 5), (2026, 1, 4)).validate();
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut g = input((2026, 1, 5), (2026, 1, 6));
        g.title = "   ".into();
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_overlong_title_rejected() {
        let mut g = input((2026, 1, 5), (2026, 1, 6));
        g.title = "x".repeat(161);
        assert!(g.validate().is_err());
    }
}
