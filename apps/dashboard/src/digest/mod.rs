// Scheduled email digests: per-user settings, trigger rules, rendering and the
// background loop that sends them.

pub mod body;
pub mod handlers;
pub mod schedule;
pub mod scheduler;
pub mod settings;
