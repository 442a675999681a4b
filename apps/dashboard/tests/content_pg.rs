mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Days, Duration, Local, Timelike, Utc};
use dashboard::articles::service::{create_article, get_article, update_article, ArticleInput};
use dashboard::digest::scheduler::{process_schedules, DigestDeps};
use dashboard::digest::settings::{mark_sent, save, EmailSettingsInput};
use dashboard::mail::{MailError, MailSender};
use dashboard::models::email_settings::EmailFrequency;
use dashboard::quantifiers::service::{create_with_first_entry, dashboard as quantifier_dashboard, upsert_entry};
use dashboard::todos::service::{create_todo, done_between, toggle_done};
use uuid::Uuid;

use common::test_db;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    fn subjects_to(&self, to: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(recipient, _)| recipient == to)
            .map(|(_, subject)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl MailSender for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> Result<(), MailError> {
        Err(MailError::Address("not-an-address".parse::<lettre::Address>().unwrap_err()))
    }
}

fn article(title: &str, new_labels: &[&str]) -> ArticleInput {
    ArticleInput {
        title: title.to_string(),
        content: "<p>body</p>".to_string(),
        is_public: true,
        cover_media_id: None,
        author_id: None,
        label_ids: Vec::new(),
        new_labels: new_labels.iter().map(|s| s.to_string()).collect(),
    }
}

fn daily_settings_at(recipient: &str, hour: u32, minute: u32) -> EmailSettingsInput {
    EmailSettingsInput {
        recipient_email: recipient.to_string(),
        enabled: true,
        frequency: EmailFrequency::Daily,
        hour: hour as i16,
        minute: minute as i16,
        day_of_week: None,
        day_of_month: None,
        include_todos: true,
        include_goals: true,
        include_articles: true,
    }
}

#[tokio::test]
async fn test_todo_toggle_stamps_and_clears_done_at() {
    let Some(db) = test_db().await else { return };
    let owner = Uuid::new_v4();
    let id = create_todo(&db.pool, owner, "  water the plants ").await.unwrap();

    let done = toggle_done(&db.pool, id, owner).await.unwrap().unwrap();
    assert!(done.is_done);
    assert_eq!(done.description, "water the plants");
    let stamped = done.done_at.unwrap();

    let window = done_between(&db.pool, owner, stamped - Duration::minutes(1), stamped + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(window.iter().map(|t| t.id).collect::<Vec<_>>(), vec![id]);

    let reopened = toggle_done(&db.pool, id, owner).await.unwrap().unwrap();
    assert!(!reopened.is_done);
    assert!(reopened.done_at.is_none());

    assert!(toggle_done(&db.pool, id, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_article_slugs_stay_unique_and_labels_are_replaced() {
    let Some(db) = test_db().await else { return };
    let title = format!("Hello World {}", Uuid::new_v4().simple());

    let first = create_article(&db.pool, &article(&title, &["rust, web"])).await.unwrap();
    let second = create_article(&db.pool, &article(&title, &[])).await.unwrap();
    assert_ne!(first.slug, second.slug);
    assert_eq!(second.slug, format!("{}-2", first.slug));

    let stored = get_article(&db.pool, first.id).await.unwrap().unwrap();
    let mut names: Vec<_> = stored.labels.iter().map(|l| l.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["rust", "web"]);

    // Same title keeps the slug; labels are swapped wholesale.
    assert!(update_article(&db.pool, first.id, &article(&title, &["systems"])).await.unwrap());
    let updated = get_article(&db.pool, first.id).await.unwrap().unwrap();
    assert_eq!(updated.article.slug, first.slug);
    assert_eq!(
        updated.labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
        vec!["systems"]
    );

    assert!(!update_article(&db.pool, i64::MAX, &article(&title, &[])).await.unwrap());
}

#[tokio::test]
async fn test_quantifier_entry_is_replaced_not_duplicated() {
    let Some(db) = test_db().await else { return };
    let user = Uuid::new_v4();
    let today = Utc::now().date_naive();
    let yesterday = today - Days::new(1);

    let id = create_with_first_entry(&db.pool, user, " push-ups ", yesterday, 20).await.unwrap();
    assert!(upsert_entry(&db.pool, user, id, today, 30).await.unwrap());
    assert!(upsert_entry(&db.pool, user, id, today, 35).await.unwrap());
    assert!(!upsert_entry(&db.pool, Uuid::new_v4(), id, today, 1).await.unwrap());

    let cards = quantifier_dashboard(&db.pool, user, today, 7).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "push-ups");
    let values: Vec<_> = cards[0].history.iter().map(|p| (p.date, p.value)).collect();
    assert_eq!(values, vec![(today, 35), (yesterday, 20)]);
}

#[tokio::test]
async fn test_saving_settings_keeps_last_sent_at() {
    let Some(db) = test_db().await else { return };
    let user = Uuid::new_v4();
    let recipient = format!("{}@example.com", Uuid::new_v4().simple());

    save(&db.pool, user, daily_settings_at(&recipient, 7, 30)).await.unwrap();
    let sent_at = Utc::now() - Duration::hours(3);
    mark_sent(&db.pool, user, sent_at).await.unwrap();

    let mut changed = daily_settings_at(&recipient, 8, 0);
    changed.include_todos = false;
    let row = save(&db.pool, user, changed).await.unwrap();
    assert_eq!((row.hour, row.minute), (8, 0));
    assert!(!row.include_todos);
    let kept = row.last_sent_at.unwrap();
    assert!((kept - sent_at).num_milliseconds().abs() < 1);
}

#[tokio::test]
async fn test_digest_sent_once_then_guarded() {
    let Some(db) = test_db().await else { return };
    let user = Uuid::new_v4();
    let recipient = format!("{}@example.com", Uuid::new_v4().simple());
    let now_local = Local::now().naive_local();
    save(&db.pool, user, daily_settings_at(&recipient, now_local.hour(), now_local.minute()))
        .await
        .unwrap();
    create_todo(&db.pool, user, "read the digest").await.unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let deps = DigestDeps {
        pool: db.pool.clone(),
        mailer: mailer.clone(),
        base_url: "https://dash.example.com".into(),
    };

    process_schedules(&deps, now_local, Utc::now()).await.unwrap();
    let subjects = mailer.subjects_to(&recipient);
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].starts_with("Daily digest - "));

    let last_sent: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT last_sent_at FROM email_settings WHERE user_id = $1")
            .bind(user)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert!(last_sent.is_some());

    // Same minute again: the guard window holds it back.
    process_schedules(&deps, now_local, Utc::now()).await.unwrap();
    assert_eq!(mailer.subjects_to(&recipient).len(), 1);
}

#[tokio::test]
async fn test_failed_send_leaves_schedule_unmarked() {
    let Some(db) = test_db().await else { return };
    let user = Uuid::new_v4();
    let recipient = format!("{}@example.com", Uuid::new_v4().simple());
    let now_local = Local::now().naive_local();
    save(&db.pool, user, daily_settings_at(&recipient, now_local.hour(), now_local.minute()))
        .await
        .unwrap();

    let deps = DigestDeps {
        pool: db.pool.clone(),
        mailer: Arc::new(FailingMailer),
        base_url: "https://dash.example.com".into(),
    };
    process_schedules(&deps, now_local, Utc::now()).await.unwrap();

    let last_sent: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT last_sent_at FROM email_settings WHERE user_id = $1")
            .bind(user)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert!(last_sent.is_none());

    let failures: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM logs WHERE event = 'EmailFailed' AND message = $1",
    )
    .bind(format!("To={recipient}"))
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_failed_stamp_does_not_skip_later_users() {
    let Some(db) = test_db().await else { return };
    let now_local = Local::now().naive_local();
    let first_user = Uuid::new_v4();
    let second_user = Uuid::new_v4();
    let first = format!("{}@example.com", Uuid::new_v4().simple());
    let second = format!("{}@example.com", Uuid::new_v4().simple());
    save(&db.pool, first_user, daily_settings_at(&first, now_local.hour(), now_local.minute()))
        .await
        .unwrap();
    save(&db.pool, second_user, daily_settings_at(&second, now_local.hour(), now_local.minute()))
        .await
        .unwrap();

    // Rejects every write to the first user's settings row.
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION reject_first_digest_stamp() RETURNS trigger AS $$
        BEGIN
            IF NEW.user_id = '{first_user}' THEN
                RAISE EXCEPTION 'stamp rejected';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#
    ))
    .execute(&db.pool)
    .await
    .unwrap();
    sqlx::query("DROP TRIGGER IF EXISTS reject_first_digest_stamp ON email_settings")
        .execute(&db.pool)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_first_digest_stamp BEFORE UPDATE ON email_settings \
         FOR EACH ROW EXECUTE FUNCTION reject_first_digest_stamp()",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let deps = DigestDeps {
        pool: db.pool.clone(),
        mailer: mailer.clone(),
        base_url: String::new(),
    };
    let result = process_schedules(&deps, now_local, Utc::now()).await;

    sqlx::query("DROP TRIGGER IF EXISTS reject_first_digest_stamp ON email_settings")
        .execute(&db.pool)
        .await
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(mailer.subjects_to(&first).len(), 1);
    assert_eq!(mailer.subjects_to(&second).len(), 1);

    let stamped: Vec<(Uuid, Option<chrono::DateTime<Utc>>)> = sqlx::query_as(
        "SELECT user_id, last_sent_at FROM email_settings WHERE user_id = ANY($1) ORDER BY id",
    )
    .bind(vec![first_user, second_user])
    .fetch_all(&db.pool)
    .await
    .unwrap();
    assert_eq!(stamped.len(), 2);
    assert!(stamped[0].1.is_none());
    assert!(stamped[1].1.is_some());

    let loop_errors: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM logs WHERE event = 'LoopError' AND message = $1",
    )
    .bind(format!("User={first_user}"))
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(loop_errors, 1);
}

#[tokio::test]
async fn test_concurrent_creates_with_same_title_get_distinct_slugs() {
    let Some(db) = test_db().await else { return };
    let title = format!("Race {}", Uuid::new_v4().simple());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..5 {
        let pool = db.pool.clone();
        let input = article(&title, &[]);
        tasks.spawn(async move { create_article(&pool, &input).await });
    }

    let mut slugs = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        slugs.push(joined.unwrap().unwrap().slug);
    }
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 5);
}
