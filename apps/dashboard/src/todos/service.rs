use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::todo::TodoRow;

const DESCRIPTION_MAX: usize = 500;

/// Trims and checks a todo description.
pub fn normalize_description(raw: &str) -> Result<String, AppError> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(AppError::Validation("description cannot be empty".into()));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(AppError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(description.to_string())
}

/// Open todos first, then by id.
pub async fn list_todos(pool: &PgPool, owner_id: Uuid) -> sqlx::Result<Vec<TodoRow>> {
    sqlx::query_as::<_, TodoRow>("SELECT * FROM todos WHERE owner_id = $1 ORDER BY is_done, id")
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

pub async fn get_todo(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<Option<TodoRow>> {
    sqlx::query_as::<_, TodoRow>("SELECT * FROM todos WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_todo(pool: &PgPool, owner_id: Uuid, description: &str) -> Result<i64, AppError> {
    let description = normalize_description(description)?;
    let id = sqlx::query_scalar("INSERT INTO todos (owner_id, description) VALUES ($1, $2) RETURNING id")
        .bind(owner_id)
        .bind(description)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn update_description(
    pool: &PgPool,
    id: i64,
    owner_id: Uuid,
    description: &str,
) -> Result<bool, AppError> {
    let description = normalize_description(description)?;
    let affected = sqlx::query("UPDATE todos SET description = $1 WHERE id = $2 AND owner_id = $3")
        .bind(description)
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn delete_todo(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<bool> {
    let affected = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

/// Flips the done flag. `done_at` is stamped when the todo becomes done and
/// cleared when it is reopened.
pub async fn toggle_done(pool: &PgPool, id: i64, owner_id: Uuid) -> sqlx::Result<Option<TodoRow>> {
    sqlx::query_as::<_, TodoRow>(
        r#"
        UPDATE todos
        SET is_done = NOT is_done,
            done_at = CASE WHEN is_done THEN NULL ELSE now() END
        WHERE id = $1 AND owner_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn open_todos<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> sqlx::Result<Vec<TodoRow>> {
    sqlx::query_as::<_, TodoRow>("SELECT * FROM todos WHERE owner_id = $1 AND NOT is_done ORDER BY id")
        .bind(owner_id)
        .fetch_all(executor)
        .await
}

/// Todos completed inside `[start, end]`, most recent first.
pub async fn done_between<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> sqlx::Result<Vec<TodoRow>> {
    sqlx::query_as::<_, TodoRow>(
        r#"
        SELECT * FROM todos
        WHERE owner_id = $1 AND is_done AND done_at BETWEEN $2 AND $3
        ORDER BY done_at DESC
        "#,
    )
    .bind(owner_id)
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_trimmed() {
        assert_eq!(normalize_description("  buy milk \n").unwrap(), "buy milk");
    }

    #[test]
    fn test_blank_description_rejected() {
        assert!(matches!(
            normalize_description("   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_length_counted_after_trim() {
        let padded = format!("  {}  ", "a".repeat(500));
        assert!(normalize_description(&padded).is_ok());
        assert!(normalize_description(&"a".repeat(501)).is_err());
    }
}
