//! Next-occurrence computation for cron expressions.

use {
    chrono::{DateTime, Utc},
    cron::Schedule,
};

use crate::error::{Error, Result};

/// Compute the first instant strictly after `now` that matches `expr`.
///
/// Accepts classic five-field expressions (min hour dom month dow),
/// six/seven-field forms with seconds and an optional year, and the
/// usual aliases (`@hourly`, `@daily`, ..., with or without the `@`).
/// The optional `timezone` is an IANA name; the expression is evaluated
/// in that zone and the result converted back to UTC.
///
/// Returns `None` if the expression has no future occurrence (e.g. a
/// day-of-month that never exists).
pub fn next_occurrence(
    expr: &str,
    timezone: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let expanded = expand_alias(expr);
    let schedule: Schedule = expanded
        .parse()
        .or_else(|_| {
            // The `cron` crate wants 7 fields (sec min hour dom month dow
            // year); config files use the classic 5. Pad seconds and year.
            let padded = format!("0 {expanded} *");
            padded.parse::<Schedule>()
        })
        .map_err(|e| Error::invalid_schedule(expr, e))?;

    let next = if let Some(tz_name) = timezone {
        let tz: chrono_tz::Tz = tz_name
            .parse()
            .map_err(|_| Error::unknown_timezone(tz_name))?;
        let now_local = now.with_timezone(&tz);
        schedule
            .after(&now_local)
            .next()
            .map(|dt| dt.with_timezone(&Utc))
    } else {
        schedule.after(&now).next()
    };

    Ok(next)
}

/// Map crontab aliases to their five-field equivalents.
fn expand_alias(expr: &str) -> &str {
    match expr.trim().trim_start_matches('@') {
        "hourly" => "0 * * * *",
        "daily" | "midnight" => "0 0 * * *",
        "weekly" => "0 0 * * Sun",
        "monthly" => "0 0 1 * *",
        "yearly" | "annually" => "0 0 1 1 *",
        _ => expr,
    }
}
