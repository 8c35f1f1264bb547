//! Cron normalization and next-tick helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for
/// seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month
/// day-of-week`. Operators often supply standard 5-field cron; a 6-field
/// expression (needed for sub-minute cycles like the default every-30s
/// schedule) passes through unchanged.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    let field_count = trimmed.split_whitespace().count();
    if field_count == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// The first scheduled instant strictly after `now`, if any.
pub(super) fn next_tick(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Non-negative wait from `now` until `next`.
pub(super) fn duration_until(now: DateTime<Utc>, next: DateTime<Utc>) -> Duration {
    next.signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
