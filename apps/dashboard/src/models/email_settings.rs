use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl EmailFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailFrequency::Daily => "daily",
            EmailFrequency::Weekly => "weekly",
            EmailFrequency::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown email frequency '{0}'")]
pub struct UnknownFrequency(String);

impl TryFrom<String> for EmailFrequency {
    type Error = UnknownFrequency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "daily" => Ok(EmailFrequency::Daily),
            "weekly" => Ok(EmailFrequency::Weekly),
            "monthly" => Ok(EmailFrequency::Monthly),
            _ => Err(UnknownFrequency(value)),
        }
    }
}

/// Per-user digest configuration. At most one row per user.
///
/// `day_of_week` counts from Sunday (0) to Saturday (6).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailSettingsRow {
    pub user_id: Uuid,
    pub recipient_email: String,
    pub enabled: bool,
    #[sqlx(try_from = "String")]
    pub frequency: EmailFrequency,
    pub hour: i16,
    pub minute: i16,
    pub day_of_week: Option<i16>,
    pub day_of_month: Option<i16>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub include_todos: bool,
    pub include_goals: bool,
    pub include_articles: bool,
}

impl EmailSettingsRow {
    /// Settings used when a user has never saved any.
    pub fn defaults_for(user_id: Uuid, recipient_email: String) -> Self {
        Self {
            user_id,
            recipient_email,
            enabled: false,
            frequency: EmailFrequency::Daily,
            hour: 9,
            minute: 0,
            day_of_week: None,
            day_of_month: None,
            last_sent_at: None,
            include_todos: true,
            include_goals: true,
            include_articles: true,
        }
    }
}
