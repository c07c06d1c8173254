//! Detect overlapping unconfirmed diffusions on a station.
//!
//! Only `unconfirmed` diffusions take part in conflicts: confirmed diffusions are
//! authoritative and never flagged. Adjacent diffusions (where one ends exactly
//! when another starts) are NOT conflicts. Detection is read-only; resolving a
//! conflict is left to an operator.

use crate::error::Result;
use crate::model::{Diffusion, DiffusionType};
use crate::month::YearMonth;
use crate::store::DiffusionStore;

/// A detected conflict between two diffusions.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    /// The earlier of the two (by start, then creation order).
    pub diffusion_a: Diffusion,
    pub diffusion_b: Diffusion,
    pub overlap_minutes: i64,
}

/// Unconfirmed diffusions on the same station that overlap `diffusion`.
///
/// Returns an empty list when `diffusion` is not itself unconfirmed, which keeps
/// the relation symmetric. Results are ordered by start, ties broken by creation
/// order.
///
/// # Errors
/// Store errors are returned unmodified.
pub fn conflicts_for(store: &impl DiffusionStore, diffusion: &Diffusion) -> Result<Vec<Diffusion>> {
    if diffusion.kind != DiffusionType::Unconfirmed {
        return Ok(Vec::new());
    }

    let mut conflicts: Vec<Diffusion> = store
        .overlapping(diffusion.start, diffusion.end())?
        .into_iter()
        .filter(|d| is_conflicting(diffusion, d))
        .collect();
    conflicts.sort_by_key(|d| (d.start, d.id));

    Ok(conflicts)
}

/// Every conflicting pair among diffusions that overlap `month`.
///
/// Two diffusions overlap when `a.start < b.end && b.start < a.end`.
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
/// Pairs are ordered by their first diffusion, then their second.
pub fn month_conflicts(store: &impl DiffusionStore, month: YearMonth) -> Result<Vec<Conflict>> {
    let mut candidates: Vec<Diffusion> = store
        .overlapping(month.start_utc(), month.end_utc())?
        .into_iter()
        .filter(|d| d.kind == DiffusionType::Unconfirmed)
        .collect();
    candidates.sort_by_key(|d| (d.start, d.id));

    let mut conflicts = Vec::new();

    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if b.start >= a.end() {
                // Sorted by start: nothing later can overlap `a`.
                break;
            }
            if is_conflicting(a, b) {
                conflicts.push(Conflict {
                    diffusion_a: a.clone(),
                    diffusion_b: b.clone(),
                    overlap_minutes: overlap_minutes(a, b),
                });
            }
        }
    }

    Ok(conflicts)
}

/// Length of the intersection of two diffusions, 0 when they do not overlap.
pub fn overlap_minutes(a: &Diffusion, b: &Diffusion) -> i64 {
    let overlap_start = a.start.max(b.start);
    let overlap_end = a.end().min(b.end());
    (overlap_end - overlap_start).num_minutes().max(0)
}

fn is_conflicting(a: &Diffusion, b: &Diffusion) -> bool {
    a.id != b.id
        && a.station == b.station
        && b.kind == DiffusionType::Unconfirmed
        && a.overlaps(b)
}
