//! The program and schedule catalog, as maintained by station operators.
//!
//! The engine only reads the catalog. Validation runs before any generation so
//! that a misconfigured schedule never produces a half-written month.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{Program, ProgramId, Schedule, ScheduleId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl Catalog {
    pub fn new(programs: Vec<Program>, schedules: Vec<Schedule>) -> Self {
        Self {
            programs,
            schedules,
        }
    }

    /// Parse a catalog from its JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn program(&self, id: ProgramId) -> Result<&Program> {
        self.programs
            .iter()
            .find(|p| p.id == id)
            .ok_or(EngineError::UnknownProgram(id))
    }

    pub fn schedule(&self, id: ScheduleId) -> Result<&Schedule> {
        self.schedules
            .iter()
            .find(|s| s.id == id)
            .ok_or(EngineError::UnknownSchedule(id))
    }

    pub fn schedules_of(&self, program: ProgramId) -> impl Iterator<Item = &Schedule> {
        self.schedules.iter().filter(move |s| s.program == program)
    }

    /// Schedules of active programs, originals before reruns, then by id.
    pub fn active_schedules(&self) -> Vec<&Schedule> {
        let mut schedules: Vec<&Schedule> = self
            .schedules
            .iter()
            .filter(|s| self.program(s.program).is_ok_and(|p| p.active))
            .collect();
        schedules.sort_by_key(|s| (s.is_rerun(), s.id));
        schedules
    }

    /// Check one schedule: its program exists, its timezone parses and its
    /// rerun link points to an existing original schedule.
    ///
    /// Frequencies are validated when they are built, so an invalid bit-set
    /// never reaches this point.
    ///
    /// # Errors
    /// Returns the first configuration error found.
    pub fn validate_schedule(&self, schedule: &Schedule) -> Result<()> {
        self.program(schedule.program)?;
        schedule.tz()?;

        let Some(target) = schedule.rerun else {
            return Ok(());
        };
        if target == schedule.id {
            return Err(EngineError::InvalidRerun {
                schedule: schedule.id,
                reason: "a schedule cannot rerun itself".to_string(),
            });
        }
        let original = self.schedule(target).map_err(|_| EngineError::InvalidRerun {
            schedule: schedule.id,
            reason: format!("rerun target {target} does not exist"),
        })?;
        if original.is_rerun() {
            return Err(EngineError::InvalidRerun {
                schedule: schedule.id,
                reason: format!("rerun target {target} is itself a rerun"),
            });
        }
        Ok(())
    }

    /// Validate every schedule in the catalog.
    pub fn validate(&self) -> Result<()> {
        self.schedules
            .iter()
            .try_for_each(|s| self.validate_schedule(s))
    }
}
