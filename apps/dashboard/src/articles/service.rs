use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::articles::sanitize::sanitize_article_html;
use crate::articles::slug::{slugify, unique_slug};
use crate::errors::AppError;
use crate::models::article::{ArticleLabelRow, ArticleRow, ArticleSummaryRow, LabelRow};

const TITLE_MAX: usize = 160;
const LABEL_NAME_MAX: usize = 64;
const SLUG_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSort {
    TitleAsc,
    TitleDesc,
    #[default]
    DateNewest,
    DateOldest,
}

impl ArticleSort {
    fn order_by(&self) -> &'static str {
        match self {
            ArticleSort::TitleAsc => "a.title ASC, a.id ASC",
            ArticleSort::TitleDesc => "a.title DESC, a.id DESC",
            ArticleSort::DateNewest => "a.created_at DESC, a.id DESC",
            ArticleSort::DateOldest => "a.created_at ASC, a.id ASC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub label_ids: Vec<i64>,
    pub search: Option<String>,
    pub sort: ArticleSort,
    pub public_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleWithLabels {
    #[serde(flatten)]
    pub article: ArticleRow,
    pub labels: Vec<LabelRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    pub cover_media_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Existing labels to attach.
    #[serde(default)]
    pub label_ids: Vec<i64>,
    /// Free-text label names; each entry may hold several comma-separated names.
    #[serde(default)]
    pub new_labels: Vec<String>,
}

impl ArticleInput {
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
        if let Some(name) = split_label_names(&self.new_labels)
            .iter()
            .find(|n| n.chars().count() > LABEL_NAME_MAX)
        {
            return Err(AppError::Validation(format!(
                "label '{name}' is longer than {LABEL_NAME_MAX} characters"
            )));
        }
        Ok(())
    }
}

/// Positive ids only, first occurrence kept.
pub fn normalize_label_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| *id > 0 && seen.insert(*id)).collect()
}

/// Splits each raw entry on commas, trims, drops empties and repeats.
pub fn split_label_names(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(String::from)
        .collect()
}

/// ILIKE pattern matching `term` anywhere, with wildcards in the term escaped.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn list_articles(pool: &PgPool, filter: &ArticleFilter) -> sqlx::Result<Vec<ArticleWithLabels>> {
    let label_ids = normalize_label_ids(&filter.label_ids);
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(contains_pattern);

    let sql = format!(
        r#"
        SELECT a.* FROM articles a
        WHERE (cardinality($1::bigint[]) = 0 OR EXISTS (
                SELECT 1 FROM article_labels al
                WHERE al.article_id = a.id AND al.label_id = ANY($1)))
          AND ($2::text IS NULL OR a.title ILIKE $2 OR a.content ILIKE $2)
          AND (NOT $3 OR a.is_public)
        ORDER BY {}
        "#,
        filter.sort.order_by()
    );

    let articles = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(&label_ids)
        .bind(pattern)
        .bind(filter.public_only)
        .fetch_all(pool)
        .await?;

    let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
    let mut labels = labels_by_article(pool, &ids).await?;

    Ok(articles
        .into_iter()
        .map(|article| {
            let labels = labels.remove(&article.id).unwrap_or_default();
            ArticleWithLabels { article, labels }
        })
        .collect())
}

async fn labels_by_article(pool: &PgPool, article_ids: &[i64]) -> sqlx::Result<HashMap<i64, Vec<LabelRow>>> {
    if article_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, ArticleLabelRow>(
        r#"
        SELECT al.article_id, l.id, l.name
        FROM article_labels al
        JOIN labels l ON l.id = al.label_id
        WHERE al.article_id = ANY($1)
        ORDER BY l.name
        "#,
    )
    .bind(article_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<LabelRow>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.article_id)
            .or_default()
            .push(LabelRow { id: row.id, name: row.name });
    }
    Ok(grouped)
}

async fn with_labels(pool: &PgPool, article: ArticleRow) -> sqlx::Result<ArticleWithLabels> {
    let labels = labels_by_article(pool, &[article.id])
        .await?
        .remove(&article.id)
        .unwrap_or_default();
    Ok(ArticleWithLabels { article, labels })
}

pub async fn get_article(pool: &PgPool, id: i64) -> sqlx::Result<Option<ArticleWithLabels>> {
    let article = sqlx::query_as::<_, ArticleRow>("SELECT * FROM articles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match article {
        Some(article) => Ok(Some(with_labels(pool, article).await?)),
        None => Ok(None),
    }
}

/// Public article by slug; private articles are indistinguishable from missing ones.
pub async fn get_public_by_slug(pool: &PgPool, slug: &str) -> sqlx::Result<Option<ArticleWithLabels>> {
    let article = sqlx::query_as::<_, ArticleRow>("SELECT * FROM articles WHERE slug = $1 AND is_public")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    match article {
        Some(article) => Ok(Some(with_labels(pool, article).await?)),
        None => Ok(None),
    }
}

/// Free slug derived from `title`, ignoring the article being edited.
async fn free_slug(conn: &mut PgConnection, title: &str, exclude_id: Option<i64>) -> sqlx::Result<String> {
    let base = slugify(title);
    let taken: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT slug FROM articles
        WHERE (slug = $1 OR slug LIKE $1 || '-%')
          AND ($2::bigint IS NULL OR id <> $2)
        "#,
    )
    .bind(&base)
    .bind(exclude_id)
    .fetch_all(&mut *conn)
    .await?;
    let taken: HashSet<String> = taken.into_iter().collect();
    Ok(unique_slug(&base, &taken))
}

/// Ids of the selected labels that exist plus the named labels, created on demand.
async fn resolve_labels(conn: &mut PgConnection, input: &ArticleInput) -> sqlx::Result<Vec<i64>> {
    let selected = normalize_label_ids(&input.label_ids);
    let mut ids: Vec<i64> = if selected.is_empty() {
        Vec::new()
    } else {
        sqlx::query_scalar("SELECT id FROM labels WHERE id = ANY($1) ORDER BY id")
            .bind(&selected)
            .fetch_all(&mut *conn)
            .await?
    };

    for name in split_label_names(&input.new_labels) {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO labels (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(&name)
        .fetch_one(&mut *conn)
        .await?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub async fn create_article(pool: &PgPool, input: &ArticleInput) -> Result<ArticleRow, AppError> {
    input.validate()?;
    let title = input.title.trim();
    let content = sanitize_article_html(&input.content);

    let mut tx = pool.begin().await?;

    // A concurrent writer may claim the free slug first; the conflicting
    // insert is skipped and the next free suffix is tried.
    let mut attempts = 0;
    let article = loop {
        attempts += 1;
        let slug = free_slug(&mut tx, title, None).await?;
        let inserted = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (title, slug, content, author_id, is_public, cover_media_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(&slug)
        .bind(&content)
        .bind(input.author_id)
        .bind(input.is_public)
        .bind(input.cover_media_id)
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(article) => break article,
            None if attempts < SLUG_ATTEMPTS => {
                warn!("Slug '{slug}' was taken concurrently, retrying");
            }
            None => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "no free slug for '{title}' after {SLUG_ATTEMPTS} attempts"
                )));
            }
        }
    };

    let label_ids = resolve_labels(&mut tx, input).await?;
    sqlx::query(
        r#"
        INSERT INTO article_labels (article_id, label_id)
        SELECT $1, label_id FROM UNNEST($2::bigint[]) AS label_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(article.id)
    .bind(&label_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Created article {} ({}) with {} label(s)", article.id, article.slug, label_ids.len());
    Ok(article)
}

/// Rewrites an article and replaces its label set. The creation date never
/// changes; the slug is regenerated only when the title does.
pub async fn update_article(pool: &PgPool, id: i64, input: &ArticleInput) -> Result<bool, AppError> {
    input.validate()?;
    let title = input.title.trim();
    let content = sanitize_article_html(&input.content);

    let mut tx = pool.begin().await?;
    let current: Option<(String, String)> =
        sqlx::query_as("SELECT title, slug FROM articles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((current_title, current_slug)) = current else {
        return Ok(false);
    };

    let slug = if current_title == title {
        current_slug
    } else {
        free_slug(&mut tx, title, Some(id)).await?
    };

    sqlx::query(
        r#"
        UPDATE articles
        SET title = $1, slug = $2, content = $3, is_public = $4, cover_media_id = $5
        WHERE id = $6
        "#,
    )
    .bind(title)
    .bind(&slug)
    .bind(&content)
    .bind(input.is_public)
    .bind(input.cover_media_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let desired = resolve_labels(&mut tx, input).await?;
    sqlx::query("DELETE FROM article_labels WHERE article_id = $1 AND label_id <> ALL($2::bigint[])")
        .bind(id)
        .bind(&desired)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO article_labels (article_id, label_id)
        SELECT $1, label_id FROM UNNEST($2::bigint[]) AS label_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(id)
    .bind(&desired)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn delete_article(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    let affected = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn list_labels(pool: &PgPool) -> sqlx::Result<Vec<LabelRow>> {
    sqlx::query_as::<_, LabelRow>("SELECT id, name FROM labels ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Articles created inside `[start, end]`, newest first.
pub async fn created_between<'e, E: PgExecutor<'e>>(
    executor: E,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> sqlx::Result<Vec<ArticleSummaryRow>> {
    sqlx::query_as::<_, ArticleSummaryRow>(
        r#"
        SELECT id, title, created_at FROM articles
        WHERE created_at BETWEEN $1 AND $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}
