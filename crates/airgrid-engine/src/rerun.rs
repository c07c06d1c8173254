//! Link rerun occurrences to the broadcast they replay.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::model::{Diffusion, DiffusionType, Schedule};
use crate::store::DiffusionStore;

/// Find the original diffusion that a rerun occurrence at `start` replays.
///
/// The original is the most recent diffusion of the rerun target's program that
/// starts strictly before `start`, is neither cancelled nor a stop sentinel, and
/// is not itself a rerun. Orphaned reruns have no `initial` but still count as
/// reruns through the schedule that generated them.
/// Ties on start go to the earliest created. Returns `Ok(None)` when nothing
/// qualifies: the caller materializes an orphaned rerun.
///
/// # Errors
/// Returns `EngineError::InvalidRerun` if `schedule` is not a rerun,
/// `EngineError::UnknownSchedule` if its target is missing from the catalog, and
/// store errors unmodified.
pub fn resolve_initial(
    store: &impl DiffusionStore,
    catalog: &Catalog,
    schedule: &Schedule,
    start: DateTime<Utc>,
) -> Result<Option<Diffusion>> {
    let target = schedule.rerun.ok_or_else(|| EngineError::InvalidRerun {
        schedule: schedule.id,
        reason: "schedule is not a rerun".to_string(),
    })?;
    let original = catalog.schedule(target)?;

    let candidates = store.for_program(original.program)?;
    let latest = candidates
        .into_iter()
        .filter(|d| d.start < start && !d.is_rerun() && !from_rerun_schedule(catalog, d))
        .filter(|d| !matches!(d.kind, DiffusionType::Cancel | DiffusionType::Stop))
        .fold(None::<Diffusion>, |best, d| match best {
            Some(b) if b.start >= d.start => Some(b),
            _ => Some(d),
        });

    Ok(latest)
}

fn from_rerun_schedule(catalog: &Catalog, diffusion: &Diffusion) -> bool {
    diffusion
        .schedule
        .and_then(|id| catalog.schedule(id).ok())
        .is_some_and(Schedule::is_rerun)
}
