//! When a digest is due and which period it covers.
//!
//! Time-of-day and day constraints are evaluated against local wall-clock
//! time; the duplicate guard compares UTC instants.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::goals::coverage::month_bounds;
use crate::models::email_settings::{EmailFrequency, EmailSettingsRow};

/// Minimum spacing between two digests for the same user.
pub const GUARD_WINDOW_MINUTES: i64 = 55;

/// Inclusive local bounds of the period a digest reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub fn should_run(settings: &EmailSettingsRow, now_local: NaiveDateTime, now_utc: DateTime<Utc>) -> bool {
    if i64::from(settings.hour) != i64::from(now_local.hour())
        || i64::from(settings.minute) != i64::from(now_local.minute())
    {
        return false;
    }

    if let Some(last) = settings.last_sent_at {
        if now_utc - last < chrono::Duration::minutes(GUARD_WINDOW_MINUTES) {
            return false;
        }
    }

    match settings.frequency {
        EmailFrequency::Daily => true,
        EmailFrequency::Weekly => settings
            .day_of_week
            .is_some_and(|d| i64::from(d) == i64::from(now_local.weekday().num_days_from_sunday())),
        EmailFrequency::Monthly => settings
            .day_of_month
            .is_some_and(|d| i64::from(d) == i64::from(now_local.day())),
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// Daily: today. Weekly: Sunday through Saturday of the current week.
/// Monthly: the current calendar month.
pub fn period_window(frequency: EmailFrequency, now_local: NaiveDateTime) -> PeriodWindow {
    let today = now_local.date();
    let (first, last) = match frequency {
        EmailFrequency::Daily => (today, today),
        EmailFrequency::Weekly => {
            let offset = u64::from(today.weekday().num_days_from_sunday());
            let sunday = today - Days::new(offset);
            (sunday, sunday + Days::new(6))
        }
        EmailFrequency::Monthly => month_bounds(today.year(), today.month()).unwrap_or((today, today)),
    };
    PeriodWindow {
        start: first.and_time(NaiveTime::MIN),
        end: end_of_day(last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn settings(frequency: EmailFrequency) -> EmailSettingsRow {
        let mut s = EmailSettingsRow::defaults_for(Uuid::nil(), "me@example.com".into());
        s.enabled = true;
        s.frequency = frequency;
        s
    }

    #[test]
    fn test_daily_runs_at_configured_minute_then_guard_blocks() {
        let mut s = settings(EmailFrequency::Daily);
        let now_local = at(2026, 5, 6, 9, 0);
        let now_utc = utc(2026, 5, 6, 7, 0);
        assert!(should_run(&s, now_local, now_utc));

        s.last_sent_at = Some(now_utc);
        assert!(!should_run(&s, now_local, now_utc));
    }

    #[test]
    fn test_wrong_minute_never_runs() {
        let s = settings(EmailFrequency::Daily);
        assert!(!should_run(&s, at(2026, 5, 6, 9, 1), utc(2026, 5, 6, 7, 1)));
        assert!(!should_run(&s, at(2026, 5, 6, 10, 0), utc(2026, 5, 6, 8, 0)));
    }

    #[test]
    fn test_guard_window_boundary() {
        let mut s = settings(EmailFrequency::Daily);
        let now_utc = utc(2026, 5, 6, 7, 0);
        s.last_sent_at = Some(now_utc - chrono::Duration::minutes(54));
        assert!(!should_run(&s, at(2026, 5, 6, 9, 0), now_utc));
        s.last_sent_at = Some(now_utc - chrono::Duration::minutes(55));
        assert!(should_run(&s, at(2026, 5, 6, 9, 0), now_utc));
    }

    #[test]
    fn test_weekly_day_mismatch() {
        // Wednesday = 3; 2026-05-07 is a Thursday
        let mut s = settings(EmailFrequency::Weekly);
        s.day_of_week = Some(3);
        assert!(!should_run(&s, at(2026, 5, 7, 9, 0), utc(2026, 5, 7, 7, 0)));
        assert!(should_run(&s, at(2026, 5, 6, 9, 0), utc(2026, 5, 6, 7, 0)));
    }

    #[test]
    fn test_missing_day_constraint_never_runs() {
        let weekly = settings(EmailFrequency::Weekly);
        assert!(!should_run(&weekly, at(2026, 5, 6, 9, 0), utc(2026, 5, 6, 7, 0)));
        let monthly = settings(EmailFrequency::Monthly);
        assert!(!should_run(&monthly, at(2026, 5, 6, 9, 0), utc(2026, 5, 6, 7, 0)));
    }

    #[test]
    fn test_monthly_matches_day_of_month() {
        let mut s = settings(EmailFrequency::Monthly);
        s.day_of_month = Some(6);
        assert!(should_run(&s, at(2026, 5, 6, 9, 0), utc(2026, 5, 6, 7, 0)));
        assert!(!should_run(&s, at(2026, 5, 7, 9, 0), utc(2026, 5, 7, 7, 0)));
    }

    #[test]
    fn test_daily_window() {
        let w = period_window(EmailFrequency::Daily, at(2026, 5, 6, 9, 0));
        assert_eq!(w.start, at(2026, 5, 6, 0, 0));
        assert_eq!(w.end, at(2026, 5, 6, 23, 59) + chrono::Duration::seconds(59));
    }

    #[test]
    fn test_weekly_window_sunday_to_saturday() {
        // Thursday 2026-05-07 -> Sunday 05-03 .. Saturday 05-09
        let w = period_window(EmailFrequency::Weekly, at(2026, 5, 7, 9, 0));
        assert_eq!(w.start, at(2026, 5, 3, 0, 0));
        assert_eq!(w.end.date(), NaiveDate::from_ymd_opt(2026, 5, 9).unwrap());
    }

    #[test]
    fn test_weekly_window_on_sunday_starts_same_day() {
        let w = period_window(EmailFrequency::Weekly, at(2026, 5, 3, 9, 0));
        assert_eq!(w.start, at(2026, 5, 3, 0, 0));
    }

    #[test]
    fn test_monthly_window_covers_month() {
        let w = period_window(EmailFrequency::Monthly, at(2026, 2, 14, 9, 0));
        assert_eq!(w.start, at(2026, 2, 1, 0, 0));
        assert_eq!(w.end.date(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }
}
