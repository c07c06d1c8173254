//! Schedule expansion -- converts a schedule into concrete occurrences for a month.
//!
//! Date selection is delegated to [`Frequency`](crate::frequency::Frequency); this
//! module stamps the selected dates with the schedule's time-of-day, localizes
//! them in the schedule's timezone with DST handling, and converts to UTC.

use chrono::{DateTime, Utc};

use crate::dst::{self, DstPolicy};
use crate::error::Result;
use crate::model::Schedule;
use crate::month::YearMonth;

/// A single occurrence of a schedule with start and end instants.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Expand a schedule into its occurrences for `month`.
///
/// Occurrences earlier than the schedule's anchor are dropped: a schedule never
/// produces broadcasts before its own reference date. The result is sorted by
/// start.
///
/// # Errors
/// Returns `EngineError::InvalidTimezone` if the schedule's timezone is not a
/// valid IANA identifier.
pub fn dates_for_month(
    schedule: &Schedule,
    month: YearMonth,
    policy: DstPolicy,
) -> Result<Vec<Occurrence>> {
    let tz = schedule.tz()?;
    let anchor = schedule.anchor;
    let duration = schedule.duration();

    let occurrences = schedule
        .frequency
        .occurrences_in_month(anchor.date(), month)
        .into_iter()
        .map(|date| date.and_time(anchor.time()))
        .filter(|local| *local >= anchor)
        .filter_map(|local| {
            let start = dst::resolve_local(&tz, local, policy);
            if start.is_none() {
                tracing::debug!(schedule = %schedule.id, %local, "occurrence skipped in DST gap");
            }
            start
        })
        .map(|start| Occurrence {
            start,
            end: start + duration,
        })
        .collect();

    Ok(occurrences)
}

/// Whether `start` is exactly one of the schedule's occurrence starts.
///
/// # Errors
/// Returns `EngineError::InvalidTimezone` for an unparseable schedule timezone.
pub fn matches(schedule: &Schedule, start: DateTime<Utc>, policy: DstPolicy) -> Result<bool> {
    let tz = schedule.tz()?;
    let local_month = YearMonth::of(start.with_timezone(&tz).date_naive());

    Ok(dates_for_month(schedule, local_month, policy)?
        .iter()
        .any(|o| o.start == start))
}
