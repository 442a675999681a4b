//! Digest email rendering.

use ammonia::clean_text;
use chrono::NaiveDate;

use crate::digest::schedule::PeriodWindow;
use crate::models::article::ArticleSummaryRow;
use crate::models::email_settings::EmailFrequency;
use crate::models::goal::GoalRow;
use crate::models::todo::TodoRow;

/// Everything one digest reports on.
#[derive(Debug, Clone)]
pub struct DigestContent {
    pub today: NaiveDate,
    pub window: PeriodWindow,
    pub open_goals: Vec<GoalRow>,
    pub new_articles: Vec<ArticleSummaryRow>,
    pub open_todos: Vec<TodoRow>,
    pub done_todos: Vec<TodoRow>,
    pub due_count: i64,
    pub review_url: String,
}

/// Joins `path` onto `base`; a blank base leaves the path relative.
pub fn absolute_url(base: &str, path: &str) -> String {
    let base = base.trim();
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn subject(frequency: EmailFrequency, today: NaiveDate, window: &PeriodWindow) -> String {
    match frequency {
        EmailFrequency::Daily => format!("Daily digest - {}", today.format("%Y-%m-%d")),
        EmailFrequency::Weekly => format!(
            "Weekly digest - week of {}",
            window.start.date().format("%Y-%m-%d")
        ),
        EmailFrequency::Monthly => format!("Monthly digest - {}", window.start.date().format("%Y-%m")),
    }
}

pub fn render_html(content: &DigestContent) -> String {
    let mut html = String::new();
    html.push_str(&format!("<p>Date: {}</p>", content.today.format("%Y-%m-%d")));
    html.push_str(&format!(
        "<p>Period: {} to {}</p>",
        content.window.start.date().format("%Y-%m-%d"),
        content.window.end.date().format("%Y-%m-%d")
    ));

    html.push_str("<h3>Today's review</h3>");
    if content.due_count > 0 {
        html.push_str(&format!(
            "<p><strong>{}</strong> question(s) to review. <a href=\"{}\">Start the session</a></p>",
            content.due_count,
            clean_text(&content.review_url)
        ));
    } else {
        html.push_str("<p>No questions to review today.</p>");
    }

    push_list(&mut html, "Open goals", &content.open_goals, |g| {
        format!(
            "{} ({} to {})",
            clean_text(&g.title),
            g.start_date.format("%Y-%m-%d"),
            g.end_date.format("%Y-%m-%d")
        )
    });
    push_list(&mut html, "Articles created this period", &content.new_articles, |a| {
        format!("{} ({})", clean_text(&a.title), a.created_at.format("%Y-%m-%d"))
    });
    push_list(&mut html, "Open todos", &content.open_todos, |t| clean_text(&t.description));
    push_list(&mut html, "Todos completed this period", &content.done_todos, |t| {
        match t.done_at {
            Some(at) => format!("{} (done {})", clean_text(&t.description), at.format("%Y-%m-%d")),
            None => clean_text(&t.description),
        }
    });

    html
}

/// Appends a titled `<ul>`; nothing at all when `items` is empty.
fn push_list<T>(html: &mut String, title: &str, items: &[T], render: impl Fn(&T) -> String) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<h3>{title}</h3><ul>"));
    for item in items {
        html.push_str(&format!("<li>{}</li>", render(item)));
    }
    html.push_str("</ul>");
}
