//! Leitner box scheduling.
//!
//! A card sits in a box in `1..=MAX_BOX`. A correct answer promotes it one box
//! and schedules it `BOX_INTERVALS_DAYS[new_box - 1]` days out. A wrong answer
//! sends it back to box 1 and always schedules it for tomorrow, independent of
//! the interval table.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

pub const MAX_BOX: i32 = 6;

/// Review interval in days, indexed by `box - 1`.
pub const BOX_INTERVALS_DAYS: [u64; MAX_BOX as usize] = [1, 2, 4, 8, 16, 32];

/// Box and due date a card starts with the first time a user meets its question.
pub const INITIAL_BOX: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxTransition {
    pub previous_box: i32,
    pub new_box: i32,
    pub next_due_date: NaiveDate,
}

pub fn next_box(current_box: i32, is_correct: bool) -> i32 {
    if is_correct {
        (current_box + 1).min(MAX_BOX)
    } else {
        1
    }
}

/// Interval for a box, clamping out-of-range boxes onto the table.
pub fn interval_days(box_number: i32) -> u64 {
    let idx = box_number.clamp(1, MAX_BOX) - 1;
    BOX_INTERVALS_DAYS[idx as usize]
}

pub fn next_due_date(today: NaiveDate, new_box: i32, is_correct: bool) -> NaiveDate {
    let days = if is_correct { interval_days(new_box) } else { 1 };
    today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Applies one review to a card currently in `current_box`.
pub fn apply_review(current_box: i32, is_correct: bool, today: NaiveDate) -> BoxTransition {
    let new_box = next_box(current_box, is_correct);
    BoxTransition {
        previous_box: current_box,
        new_box,
        next_due_date: next_due_date(today, new_box, is_correct),
    }
}

/// Question ids that have no card yet, in the order of `all_question_ids`.
pub fn missing_question_ids(all_question_ids: &[i64], existing_card_question_ids: &[i64]) -> Vec<i64> {
    let existing: HashSet<i64> = existing_card_question_ids.iter().copied().collect();
    all_question_ids
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect()
}
