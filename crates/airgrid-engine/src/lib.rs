//! # airgrid-engine
//!
//! Deterministic broadcast calendar generation for a radio station.
//!
//! Recurring [`Schedule`]s ("every first and third Monday at 18:00") are
//! expanded month by month into concrete [`Diffusion`]s. Reruns are linked to the
//! broadcast they replay, and overlapping unconfirmed diffusions are surfaced
//! for an operator to resolve. Every run is idempotent, and "now" is always
//! passed in explicitly.
//!
//! ## Modules
//!
//! - [`frequency`]: recurrence bit-sets → dates of a month
//! - [`generator`]: schedule → occurrences of a month, in UTC
//! - [`dst`]: DST gap policies (skip, shift, wall clock)
//! - [`rerun`]: link rerun occurrences to their original broadcast
//! - [`materialize`]: occurrences → persisted diffusions
//! - [`conflict`]: overlapping unconfirmed diffusions
//! - [`lifecycle`]: confirm, cancel, clean and check
//! - [`store`]: diffusion persistence contract and in-memory store
//! - [`catalog`], [`model`], [`month`], [`config`]: data and settings
//! - [`error`]: Error types

pub mod catalog;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod frequency;
pub mod generator;
pub mod lifecycle;
pub mod materialize;
pub mod model;
pub mod month;
pub mod rerun;
pub mod store;

pub use catalog::Catalog;
pub use config::{ApprovalMode, EngineConfig};
pub use conflict::{conflicts_for, month_conflicts, Conflict};
pub use dst::DstPolicy;
pub use error::{EngineError, StoreError};
pub use frequency::Frequency;
pub use generator::{dates_for_month, Occurrence};
pub use materialize::{MaterializeReport, Materializer};
pub use model::{
    Diffusion, DiffusionId, DiffusionType, NewDiffusion, Program, ProgramId, Schedule, ScheduleId,
    StationId,
};
pub use month::YearMonth;
pub use store::{DiffusionStore, MemoryStore};
