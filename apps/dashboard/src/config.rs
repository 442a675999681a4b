use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Absolute base used for links embedded in digest emails. May be empty.
    pub app_base_url: String,
    pub smtp: SmtpConfig,
    pub digest_wake_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub enable_ssl: bool,
    pub user: String,
    pub password: String,
    pub from_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            app_base_url: std::env::var("APP_BASE_URL").unwrap_or_default(),
            smtp: SmtpConfig {
                host: require_env("SMTP_HOST")?,
                port: parse_env("SMTP_PORT", 587)?,
                enable_ssl: parse_env("SMTP_ENABLE_SSL", true)?,
                user: std::env::var("SMTP_USER").unwrap_or_default(),
                password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: require_env("SMTP_FROM")?,
            },
            digest_wake_interval: Duration::from_secs(parse_env("DIGEST_WAKE_SECS", 60)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
