use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::quantifier::{QuantifierEntryRow, QuantifierRow};

pub const DEFAULT_HISTORY_DAYS: u32 = 7;
pub const MAX_HISTORY_DAYS: u32 = 365;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryPoint {
    pub date: NaiveDate,
    pub value: i32,
}

/// One quantifier with its recent history, newest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct QuantifierCard {
    pub id: i64,
    pub name: String,
    pub history: Vec<EntryPoint>,
}

/// First day included in a `days`-long history ending on `today`.
pub fn history_start(today: NaiveDate, days: u32) -> NaiveDate {
    let days = days.clamp(1, MAX_HISTORY_DAYS);
    today - Days::new(u64::from(days - 1))
}

pub async fn dashboard(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    history_days: u32,
) -> sqlx::Result<Vec<QuantifierCard>> {
    let quantifiers = sqlx::query_as::<_, QuantifierRow>(
        "SELECT * FROM quantifiers WHERE user_id = $1 ORDER BY name, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    if quantifiers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = quantifiers.iter().map(|q| q.id).collect();
    let entries = sqlx::query_as::<_, QuantifierEntryRow>(
        r#"
        SELECT quantifier_id, entry_date, value FROM quantifier_entries
        WHERE quantifier_id = ANY($1) AND entry_date >= $2
        ORDER BY entry_date DESC
        "#,
    )
    .bind(&ids)
    .bind(history_start(today, history_days))
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<EntryPoint>> = HashMap::new();
    for e in entries {
        grouped.entry(e.quantifier_id).or_default().push(EntryPoint {
            date: e.entry_date,
            value: e.value,
        });
    }

    Ok(quantifiers
        .into_iter()
        .map(|q| QuantifierCard {
            history: grouped.remove(&q.id).unwrap_or_default(),
            id: q.id,
            name: q.name,
        })
        .collect())
}

pub async fn create_with_first_entry(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    date: NaiveDate,
    value: i32,
) -> Result<i64, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".into()));
    }

    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar("INSERT INTO quantifiers (user_id, name) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO quantifier_entries (quantifier_id, entry_date, value) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(date)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(id)
}

/// Sets the value for `date`, replacing any previous one. Returns `false` when
/// the quantifier does not belong to `user_id`.
pub async fn upsert_entry(
    pool: &PgPool,
    user_id: Uuid,
    quantifier_id: i64,
    date: NaiveDate,
    value: i32,
) -> sqlx::Result<bool> {
    let owns: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM quantifiers WHERE id = $1 AND user_id = $2)",
    )
    .bind(quantifier_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if !owns {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO quantifier_entries (quantifier_id, entry_date, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (quantifier_id, entry_date)
        DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        "#,
    )
    .bind(quantifier_id)
    .bind(date)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(true)
}
