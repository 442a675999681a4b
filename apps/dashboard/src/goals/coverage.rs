use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::goal::GoalRow;

/// First and last calendar day of a month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

/// For each day of the month covered by at least one goal: `true` when every
/// covering goal is done. Days without a goal are absent.
pub fn monthly_coverage_map(
    goals: &[GoalRow],
    first: NaiveDate,
    last: NaiveDate,
) -> BTreeMap<NaiveDate, bool> {
    let mut map = BTreeMap::new();
    for date in first.iter_days().take_while(|d| *d <= last) {
        let mut covering = goals.iter().filter(|g| g.covers(date)).peekable();
        if covering.peek().is_none() {
            continue;
        }
        map.insert(date, covering.all(|g| g.is_done));
    }
    map
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// `Some(true)` all goals done, `Some(false)` some open, `None` no goal.
    pub all_done: Option<bool>,
}

/// Monday-first weeks of the month; `None` cells pad the first and last rows.
pub fn calendar_rows(
    first: NaiveDate,
    last: NaiveDate,
    coverage: &BTreeMap<NaiveDate, bool>,
) -> Vec<Vec<Option<CalendarCell>>> {
    let mut rows = Vec::new();
    let mut row: Vec<Option<CalendarCell>> =
        vec![None; first.weekday().num_days_from_monday() as usize];

    for date in first.iter_days().take_while(|d| *d <= last) {
        row.push(Some(CalendarCell {
            date,
            all_done: coverage.get(&date).copied(),
        }));
        if row.len() == 7 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        row.resize(7, None);
        rows.push(row);
    }
    rows
}
