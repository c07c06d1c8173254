//! DST transition policies for schedule occurrences.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for occurrences whose wall-clock time falls in a DST gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Skip instances that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid time after the gap
    ShiftForward,
    /// Keep the pre-transition UTC offset (2:30 AM becomes 3:30 AM)
    #[default]
    WallClock,
}

/// Longest DST gap we search across when shifting forward.
const MAX_GAP_MINUTES: i64 = 180;

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Times in a gap
/// follow `policy`; `None` means the occurrence is skipped.
pub fn resolve_local(tz: &Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(instant) = earliest(tz, local) {
        return Some(instant);
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES)
            .find_map(|m| earliest(tz, local + Duration::minutes(m))),
        DstPolicy::WallClock => (1..=MAX_GAP_MINUTES)
            .find_map(|m| earliest(tz, local - Duration::minutes(m)).map(|t| t + Duration::minutes(m))),
    }
}

fn earliest(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(a, b) => Some(a.min(b).with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
