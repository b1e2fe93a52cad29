//! Cron expression handling.
//!
//! Clients submit classic 5-field expressions (`minute hour dom month dow`).
//! The scheduler wants a leading seconds field, so those get `0` prepended.
//! 6- and 7-field expressions are passed through. Validation is done by
//! building a throwaway job with the scheduler's own parser; all schedules
//! fire in UTC.

use tokio_cron_scheduler::Job;

use crate::jobs::error::{SchedulerError, SchedulerResult};

/// Rewrites `expr` into the form the scheduler accepts.
pub fn normalize(expr: &str) -> SchedulerResult<String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();

    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        0 => Err(SchedulerError::invalid_schedule(expr, "schedule is empty")),
        n => Err(SchedulerError::invalid_schedule(
            expr,
            format!("expected 5, 6 or 7 fields, got {}", n),
        )),
    }
}

/// Normalizes and parses `expr`, returning the normalized form.
pub fn validate(expr: &str) -> SchedulerResult<String> {
    let normalized = normalize(expr)?;

    Job::new_async(normalized.as_str(), |_uuid, _lock| Box::pin(async {}))
        .map_err(|e| SchedulerError::invalid_schedule(expr, e.to_string()))?;

    Ok(normalized)
}
