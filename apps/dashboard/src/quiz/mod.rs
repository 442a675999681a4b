// Quiz question bank and per-user Leitner review state.

pub mod bank;
pub mod cards;
pub mod handlers;
pub mod leitner;
