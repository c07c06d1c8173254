//! Programs, schedules and diffusions.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::frequency::Frequency;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(
    /// A broadcast stream: diffusions only conflict within one station.
    StationId
);
id_type!(ProgramId);
id_type!(ScheduleId);
id_type!(
    /// Store-assigned, strictly increasing in creation order.
    DiffusionId
);

/// A named recurring show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub station: StationId,
    /// Inactive programs are never materialized.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A recurrence rule bound to a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub program: ProgramId,
    /// Local wall-clock date-time of the reference occurrence. Its weekday and
    /// time-of-day are the pattern's weekday and time.
    pub anchor: NaiveDateTime,
    /// IANA timezone of `anchor` (e.g. "Europe/Brussels").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub duration_minutes: u32,
    pub frequency: Frequency,
    /// Set when this schedule reruns another schedule's broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerun: Option<ScheduleId>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Schedule {
    pub fn is_rerun(&self) -> bool {
        self.rerun.is_some()
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Parse the schedule's timezone.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTimezone` if it is not an IANA identifier.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(self.timezone.clone()))
    }
}

/// Diffusion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionType {
    /// Confirmed, normal broadcast.
    #[default]
    Default,
    /// Generated and awaiting operator confirmation.
    Unconfirmed,
    /// Explicitly cancelled. Ignored by duplicate checks and conflicts.
    Cancel,
    /// Marks an early end to the station's programming for that slot.
    Stop,
}

impl fmt::Display for DiffusionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Unconfirmed => "unconfirmed",
            Self::Cancel => "cancel",
            Self::Stop => "stop",
        })
    }
}

/// One concrete broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diffusion {
    pub id: DiffusionId,
    pub program: ProgramId,
    pub station: StationId,
    /// The schedule this diffusion was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleId>,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub kind: DiffusionType,
    /// The original diffusion this one replays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<DiffusionId>,
}

impl Diffusion {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_rerun(&self) -> bool {
        self.initial.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == DiffusionType::Cancel
    }

    /// Half-open interval intersection: `[a.start, a.end)` and `[b.start, b.end)`.
    /// Back-to-back diffusions do not overlap.
    pub fn overlaps(&self, other: &Diffusion) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// A diffusion about to be inserted; the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiffusion {
    pub program: ProgramId,
    pub station: StationId,
    pub schedule: Option<ScheduleId>,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub kind: DiffusionType,
    pub initial: Option<DiffusionId>,
}

impl NewDiffusion {
    pub fn with_id(self, id: DiffusionId) -> Diffusion {
        Diffusion {
            id,
            program: self.program,
            station: self.station,
            schedule: self.schedule,
            start: self.start,
            duration_minutes: self.duration_minutes,
            kind: self.kind,
            initial: self.initial,
        }
    }
}
