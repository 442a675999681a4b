use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub article_id: Option<i64>,
    pub is_done: bool,
}

impl GoalRow {
    /// True when `day` lies inside the goal's inclusive period.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date >= day
    }
}
