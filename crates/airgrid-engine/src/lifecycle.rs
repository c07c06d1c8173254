//! Diffusion status transitions and calendar maintenance.
//!
//! Nothing here deletes a diffusion: cancelling is a status change, so the
//! calendar keeps its history.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, StoreError};
use crate::generator;
use crate::model::{Diffusion, DiffusionId, DiffusionType};
use crate::month::YearMonth;
use crate::store::DiffusionStore;

/// Promote an unconfirmed diffusion to `default`.
///
/// # Errors
/// Returns `EngineError::InvalidTransition` unless the diffusion is unconfirmed.
pub fn confirm(store: &mut impl DiffusionStore, id: DiffusionId) -> Result<Diffusion> {
    transition(store, id, DiffusionType::Default, |from| {
        from == DiffusionType::Unconfirmed
    })
}

/// Cancel a diffusion.
///
/// # Errors
/// Returns `EngineError::InvalidTransition` if it is already cancelled: a
/// cancelled diffusion may have been superseded at the same start.
pub fn cancel(store: &mut impl DiffusionStore, id: DiffusionId) -> Result<Diffusion> {
    transition(store, id, DiffusionType::Cancel, |from| {
        from != DiffusionType::Cancel
    })
}

fn transition(
    store: &mut impl DiffusionStore,
    id: DiffusionId,
    to: DiffusionType,
    allowed: impl Fn(DiffusionType) -> bool,
) -> Result<Diffusion> {
    let diffusion = store.get(id)?.ok_or(StoreError::NotFound(id))?;
    if !allowed(diffusion.kind) {
        return Err(EngineError::InvalidTransition {
            id,
            from: diffusion.kind,
            to,
        });
    }
    Ok(store.set_type(id, to)?)
}

/// Cancel every unconfirmed diffusion starting before `month`.
///
/// Returns the cancelled diffusions.
pub fn clean(store: &mut impl DiffusionStore, month: YearMonth) -> Result<Vec<Diffusion>> {
    let stale: Vec<Diffusion> = store
        .starting_between(DateTime::<Utc>::MIN_UTC, month.start_utc())?
        .into_iter()
        .filter(|d| d.kind == DiffusionType::Unconfirmed)
        .collect();

    info!("[clean] {} unconfirmed diffusions before {month} will be cancelled", stale.len());
    cancel_all(store, stale)
}

/// Cancel every unconfirmed diffusion starting from `month` on that no longer
/// matches any schedule of its program.
///
/// Returns the cancelled diffusions.
pub fn check(
    store: &mut impl DiffusionStore,
    catalog: &Catalog,
    config: &EngineConfig,
    month: YearMonth,
) -> Result<Vec<Diffusion>> {
    let pending = store
        .starting_between(month.start_utc(), DateTime::<Utc>::MAX_UTC)?
        .into_iter()
        .filter(|d| d.kind == DiffusionType::Unconfirmed);

    let mut unmatched = Vec::new();
    for diffusion in pending {
        let mut matched = false;
        for schedule in catalog.schedules_of(diffusion.program) {
            if generator::matches(schedule, diffusion.start, config.dst_policy)? {
                matched = true;
                break;
            }
        }
        if !matched {
            unmatched.push(diffusion);
        }
    }

    info!("[check] {} unconfirmed diffusions from {month} match no schedule and will be cancelled", unmatched.len());
    cancel_all(store, unmatched)
}

fn cancel_all(store: &mut impl DiffusionStore, diffusions: Vec<Diffusion>) -> Result<Vec<Diffusion>> {
    diffusions
        .into_iter()
        .map(|d| {
            store
                .set_type(d.id, DiffusionType::Cancel)
                .map_err(EngineError::from)
        })
        .collect()
}
