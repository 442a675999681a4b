//! Static CV content bundled into the binary.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const PORTFOLIO_JSON: &str = include_str!("../content/portfolio.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub period: String,
    /// Trusted markup, rendered as-is by the site.
    pub description_html: String,
    pub technologies: Vec<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    pub name: String,
    pub description_html: String,
    /// Empty once the site has been retired.
    pub url: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub experiences: Vec<Experience>,
    pub websites: Vec<Website>,
}

pub fn load() -> Result<Portfolio, serde_json::Error> {
    serde_json::from_str(PORTFOLIO_JSON)
}

/// GET /api/v1/portfolio
pub async fn handle_portfolio() -> Result<Json<Portfolio>, AppError> {
    let portfolio = load().map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(portfolio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_content_parses() {
        let p = load().unwrap();
        assert!(!p.experiences.is_empty());
        assert!(p.experiences.iter().all(|e| !e.technologies.is_empty()));
    }

    #[test]
    fn test_retired_site_has_empty_url() {
        let p = load().unwrap();
        assert!(p.websites.iter().any(|w| w.url.is_empty()));
    }
}
