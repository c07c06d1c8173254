//! Error types for airgrid-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{DiffusionId, DiffusionType, ProgramId, ScheduleId};

/// Errors raised by a [`DiffusionStore`](crate::store::DiffusionStore).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A non-cancelled diffusion already exists for this program and start.
    /// The materializer treats this as "already materialized".
    #[error("Diffusion already exists for program {program} at {start}")]
    Duplicate {
        program: ProgramId,
        start: DateTime<Utc>,
    },

    #[error("Diffusion not found: {0}")]
    NotFound(DiffusionId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Invalid rerun for schedule {schedule}: {reason}")]
    InvalidRerun { schedule: ScheduleId, reason: String },

    #[error("Unknown program: {0}")]
    UnknownProgram(ProgramId),

    #[error("Unknown schedule: {0}")]
    UnknownSchedule(ScheduleId),

    #[error("Cannot change diffusion {id} from {from} to {to}")]
    InvalidTransition {
        id: DiffusionId,
        from: DiffusionType,
        to: DiffusionType,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
