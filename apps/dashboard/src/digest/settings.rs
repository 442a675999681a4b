use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::email_settings::{EmailFrequency, EmailSettingsRow};

fn default_true() -> bool {
    true
}

/// Editable part of a user's digest settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettingsInput {
    pub recipient_email: String,
    #[serde(default)]
    pub enabled: bool,
    pub frequency: EmailFrequency,
    pub hour: i16,
    pub minute: i16,
    pub day_of_week: Option<i16>,
    pub day_of_month: Option<i16>,
    #[serde(default = "default_true")]
    pub include_todos: bool,
    #[serde(default = "default_true")]
    pub include_goals: bool,
    #[serde(default = "default_true")]
    pub include_articles: bool,
}

impl EmailSettingsInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let recipient = self.recipient_email.trim();
        if recipient.is_empty() {
            return Err(AppError::Validation("recipient_email cannot be empty".into()));
        }
        if recipient.parse::<lettre::Address>().is_err() {
            return Err(AppError::Validation(format!(
                "recipient_email '{recipient}' is not a valid address"
            )));
        }
        if !(0..=23).contains(&self.hour) {
            return Err(AppError::Validation("hour must be between 0 and 23".into()));
        }
        if !(0..=59).contains(&self.minute) {
            return Err(AppError::Validation("minute must be between 0 and 59".into()));
        }
        if self.day_of_week.is_some_and(|d| !(0..=6).contains(&d)) {
            return Err(AppError::Validation(
                "day_of_week must be between 0 (Sunday) and 6".into(),
            ));
        }
        if self.day_of_month.is_some_and(|d| !(1..=31).contains(&d)) {
            return Err(AppError::Validation(
                "day_of_month must be between 1 and 31".into(),
            ));
        }
        match self.frequency {
            EmailFrequency::Weekly if self.day_of_week.is_none() => Err(AppError::Validation(
                "weekly digests need a day_of_week".into(),
            )),
            EmailFrequency::Monthly if self.day_of_month.is_none() => Err(AppError::Validation(
                "monthly digests need a day_of_month".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Drops day fields that the frequency does not use.
    pub fn normalized(mut self) -> Self {
        self.recipient_email = self.recipient_email.trim().to_string();
        match self.frequency {
            EmailFrequency::Daily => {
                self.day_of_week = None;
                self.day_of_month = None;
            }
            EmailFrequency::Weekly => self.day_of_month = None,
            EmailFrequency::Monthly => self.day_of_week = None,
        }
        self
    }
}

/// Stored settings, or unsaved defaults addressed to `default_recipient`.
pub async fn get_or_default(
    pool: &PgPool,
    user_id: Uuid,
    default_recipient: &str,
) -> sqlx::Result<EmailSettingsRow> {
    let stored = sqlx::query_as::<_, EmailSettingsRow>("SELECT * FROM email_settings WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(stored.unwrap_or_else(|| EmailSettingsRow::defaults_for(user_id, default_recipient.to_string())))
}

/// Validates, normalises and upserts. `last_sent_at` is never touched here.
pub async fn save(pool: &PgPool, user_id: Uuid, input: EmailSettingsInput) -> Result<EmailSettingsRow, AppError> {
    input.validate()?;
    let input = input.normalized();

    let row = sqlx::query_as::<_, EmailSettingsRow>(
        r#"
        INSERT INTO email_settings
            (user_id, recipient_email, enabled, frequency, hour, minute,
             day_of_week, day_of_month, include_todos, include_goals, include_articles)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id) DO UPDATE SET
            recipient_email = EXCLUDED.recipient_email,
            enabled = EXCLUDED.enabled,
            frequency = EXCLUDED.frequency,
            hour = EXCLUDED.hour,
            minute = EXCLUDED.minute,
            day_of_week = EXCLUDED.day_of_week,
            day_of_month = EXCLUDED.day_of_month,
            include_todos = EXCLUDED.include_todos,
            include_goals = EXCLUDED.include_goals,
            include_articles = EXCLUDED.include_articles
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.recipient_email)
    .bind(input.enabled)
    .bind(input.frequency.as_str())
    .bind(input.hour)
    .bind(input.minute)
    .bind(input.day_of_week)
    .bind(input.day_of_month)
    .bind(input.include_todos)
    .bind(input.include_goals)
    .bind(input.include_articles)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn enabled_settings(pool: &PgPool) -> sqlx::Result<Vec<EmailSettingsRow>> {
    sqlx::query_as::<_, EmailSettingsRow>("SELECT * FROM email_settings WHERE enabled ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn mark_sent<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid, at: DateTime<Utc>) -> sqlx::Result<()> {
    sqlx::query("UPDATE email_settings SET last_sent_at = $1 WHERE user_id = $2")
        .bind(at)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(frequency: EmailFrequency) -> EmailSettingsInput {
        EmailSettingsInput {
            recipient_email: " me@example.com ".into(),
            enabled: true,
            frequency,
            hour: 9,
            minute: 0,
            day_of_week: Some(3),
            day_of_month: Some(15),
            include_todos: true,
            include_goals: true,
            include_articles: false,
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(input(EmailFrequency::Daily).validate().is_ok());
    }

    #[test]
    fn test_time_bounds() {
        let mut s = input(EmailFrequency::Daily);
        s.hour = 24;
        assert!(s.validate().is_err());
        let mut s = input(EmailFrequency::Daily);
        s.minute = 60;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_day_bounds() {
        let mut s = input(EmailFrequency::Weekly);
        s.day_of_week = Some(7);
        assert!(s.validate().is_err());
        let mut s = input(EmailFrequency::Monthly);
        s.day_of_month = Some(0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_weekly_requires_weekday() {
        let mut s = input(EmailFrequency::Weekly);
        s.day_of_week = None;
        assert!(matches!(s.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_monthly_requires_day_of_month() {
        let mut s = input(EmailFrequency::Monthly);
        s.day_of_month = None;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_bad_recipient_rejected() {
        let mut s = input(EmailFrequency::Daily);
        s.recipient_email = "not-an-address".into();
        assert!(s.validate().is_err());
        s.recipient_email = "   ".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_normalize_by_frequency() {
        let daily = input(EmailFrequency::Daily).normalized();
        assert_eq!((daily.day_of_week, daily.day_of_month), (None, None));
        assert_eq!(daily.recipient_email, "me@example.com");

        let weekly = input(EmailFrequency::Weekly).normalized();
        assert_eq!((weekly.day_of_week, weekly.day_of_month), (Some(3), None));

        let monthly = input(EmailFrequency::Monthly).normalized();
        assert_eq!((monthly.day_of_week, monthly.day_of_month), (None, Some(15)));
    }
}
