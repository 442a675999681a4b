//! Background digest task.
//!
//! Wakes on a fixed interval, checks every enabled schedule and mails the
//! users whose configured minute has come. Users are processed one after the
//! other; each one gets its own pooled connection for the duration of its
//! pass. Shutdown is observed while waiting, never mid-pass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use sqlx::{PgConnection, PgPool};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::articles::service::created_between;
use crate::audit::{self, Level};
use crate::digest::body::{absolute_url, render_html, subject, DigestContent};
use crate::digest::schedule::{period_window, should_run};
use crate::digest::settings::{enabled_settings, mark_sent};
use crate::goals::service::open_goals_covering;
use crate::mail::{MailError, MailSender};
use crate::models::email_settings::EmailSettingsRow;
use crate::quiz::cards::get_due_count;
use crate::todos::service::{done_between, open_todos};

const SOURCE: &str = "DigestScheduler";

/// Shared dependencies of the digest loop.
#[derive(Clone)]
pub struct DigestDeps {
    pub pool: PgPool,
    pub mailer: Arc<dyn MailSender>,
    pub base_url: String,
}

/// Handle to the spawned scheduler task.
pub struct DigestScheduler {
    shutdown_tx: broadcast::Sender<()>,
    task_handle: Option<JoinHandle<()>>,
}

impl DigestScheduler {
    pub fn spawn(deps: DigestDeps, wake: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task_handle = tokio::spawn(run_loop(deps, wake, shutdown_rx));
        Self {
            shutdown_tx,
            task_handle: Some(task_handle),
        }
    }

    /// Signals shutdown and waits for the loop to finish its current pass.
    pub async fn stop(&mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.task_handle.take() {
            handle.await?;
        }
        info!("Digest scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

async fn run_loop(deps: DigestDeps, wake: Duration, mut shutdown_rx: broadcast::Receiver<()>) {
    info!("Digest scheduler started, waking every {}s", wake.as_secs());
    audit::record(
        &deps.pool,
        Level::Info,
        SOURCE,
        "ServiceStart",
        Some("digest scheduler started"),
        None,
    )
    .await;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(wake) => {}
            _ = shutdown_rx.recv() => {
                info!("Digest scheduler received shutdown signal");
                break;
            }
        }

        let now_local = Local::now().naive_local();
        if let Err(e) = process_schedules(&deps, now_local, Utc::now()).await {
            error!("Digest pass failed: {e:#}");
            let detail = format!("{e:#}");
            audit::record(
                &deps.pool,
                Level::Error,
                SOURCE,
                "LoopError",
                Some("digest pass failed"),
                Some(&detail),
            )
            .await;
        }
    }

    audit::record(
        &deps.pool,
        Level::Info,
        SOURCE,
        "ServiceStopped",
        Some("digest scheduler stopped"),
        None,
    )
    .await;
}

/// One pass over all enabled schedules. Returns how many digests were sent.
///
/// A failure for one user is audited and never stops the pass; only failing
/// to list the schedules does.
pub async fn process_schedules(
    deps: &DigestDeps,
    now_local: NaiveDateTime,
    now_utc: DateTime<Utc>,
) -> Result<usize> {
    let review_url = absolute_url(&deps.base_url, "/review");
    let mut sent = 0;

    for settings in enabled_settings(&deps.pool).await? {
        if !should_run(&settings, now_local, now_utc) {
            continue;
        }

        match process_user(deps, &settings, now_local, now_utc, &review_url).await {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(e) => {
                warn!("Digest pass for {} failed: {e:#}", settings.user_id);
                let user = format!("User={}", settings.user_id);
                let detail = format!("{e:#}");
                audit::record(
                    &deps.pool,
                    Level::Error,
                    SOURCE,
                    "LoopError",
                    Some(&user),
                    Some(&detail),
                )
                .await;
            }
        }
    }

    Ok(sent)
}

/// Assembles, sends and stamps one user's digest on its own pooled
/// connection. `Ok(false)` means the mail could not be delivered.
async fn process_user(
    deps: &DigestDeps,
    settings: &EmailSettingsRow,
    now_local: NaiveDateTime,
    now_utc: DateTime<Utc>,
    review_url: &str,
) -> Result<bool> {
    let mut conn = deps
        .pool
        .acquire()
        .await
        .context("acquiring a connection")?;
    let content = assemble(&mut conn, settings, now_local, now_utc, review_url)
        .await
        .context("assembling digest content")?;

    if let Err(e) = send_digest(deps.mailer.as_ref(), settings, &content).await {
        warn!("Digest to {} failed: {e}", settings.recipient_email);
        let to = format!("To={}", settings.recipient_email);
        audit::record(
            &deps.pool,
            Level::Error,
            SOURCE,
            "EmailFailed",
            Some(&to),
            Some(&e.to_string()),
        )
        .await;
        return Ok(false);
    }

    let message = format!(
        "To={}; DueQuestions={}; Window={}-{}",
        settings.recipient_email, content.due_count, content.window.start, content.window.end
    );
    audit::record(&deps.pool, Level::Info, SOURCE, "EmailSent", Some(&message), None).await;

    mark_sent(&mut *conn, settings.user_id, Utc::now())
        .await
        .context("stamping last_sent_at")?;
    Ok(true)
}

/// Converts a local wall-clock time to UTC, taking the earlier instant when
/// the local time is ambiguous.
fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

async fn assemble(
    conn: &mut PgConnection,
    settings: &EmailSettingsRow,
    now_local: NaiveDateTime,
    now_utc: DateTime<Utc>,
    review_url: &str,
) -> sqlx::Result<DigestContent> {
    let today = now_local.date();
    let window = period_window(settings.frequency, now_local);
    let (start, end) = (local_to_utc(window.start), local_to_utc(window.end));
    let user_id = settings.user_id;

    let open_goals = if settings.include_goals {
        open_goals_covering(&mut *conn, user_id, today).await?
    } else {
        Vec::new()
    };
    let new_articles = if settings.include_articles {
        created_between(&mut *conn, start, end).await?
    } else {
        Vec::new()
    };
    let (open, done) = if settings.include_todos {
        (
            open_todos(&mut *conn, user_id).await?,
            done_between(&mut *conn, user_id, start, end).await?,
        )
    } else {
        (Vec::new(), Vec::new())
    };
    let due_count = get_due_count(&mut *conn, user_id, now_utc.date_naive()).await?;

    Ok(DigestContent {
        today,
        window,
        open_goals,
        new_articles,
        open_todos: open,
        done_todos: done,
        due_count,
        review_url: review_url.to_string(),
    })
}

pub async fn send_digest(
    mailer: &dyn MailSender,
    settings: &EmailSettingsRow,
    content: &DigestContent,
) -> Result<(), MailError> {
    let subject = subject(settings.frequency, content.today, &content.window);
    let body = render_html(content);
    mailer.send(&settings.recipient_email, &subject, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::email_settings::EmailFrequency;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), html_body.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl MailSender for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> Result<(), MailError> {
            Err(MailError::Address(
                "invalid".parse::<lettre::Address>().unwrap_err(),
            ))
        }
    }

    fn content(now: NaiveDateTime) -> DigestContent {
        DigestContent {
            today: now.date(),
            window: period_window(EmailFrequency::Weekly, now),
            open_goals: vec![],
            new_articles: vec![],
            open_todos: vec![],
            done_todos: vec![],
            due_count: 2,
            review_url: "/review".into(),
        }
    }

    fn weekly_settings() -> EmailSettingsRow {
        let mut s = EmailSettingsRow::defaults_for(Uuid::nil(), "me@example.com".into());
        s.frequency = EmailFrequency::Weekly;
        s.day_of_week = Some(4);
        s
    }

    #[tokio::test]
    async fn test_send_digest_uses_recipient_and_subject() {
        let mailer = RecordingMailer::default();
        let now = NaiveDate::from_ymd_opt(2026, 5, 7).unwrap().and_hms_opt(9, 0, 0).unwrap();

        send_digest(&mailer, &weekly_settings(), &content(now)).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "me@example.com");
        assert_eq!(sent[0].1, "Weekly digest - week of 2026-05-03");
        assert!(sent[0].2.contains("<strong>2</strong>"));
    }

    #[tokio::test]
    async fn test_send_digest_surfaces_mail_errors() {
        let now = NaiveDate::from_ymd_opt(2026, 5, 7).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let mut settings = weekly_settings();
        settings.recipient_email = "invalid".into();

        let result = send_digest(&FailingMailer, &settings, &content(now)).await;
        assert!(matches!(result, Err(MailError::Address(_))));
    }

    #[test]
    fn test_local_to_utc_round_trips_ordinary_time() {
        let local = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let utc = local_to_utc(local);
        assert_eq!(utc.with_timezone(&Local).naive_local(), local);
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown_signal() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let deps = DigestDeps {
            pool,
            mailer: Arc::new(RecordingMailer::default()),
            base_url: String::new(),
        };

        let mut scheduler = DigestScheduler::spawn(deps, Duration::from_secs(3600));
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }
}
