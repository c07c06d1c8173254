//! Turn schedule occurrences into persisted diffusions.
//!
//! Materialization is incremental and idempotent: occurrences that already have
//! a non-cancelled diffusion are skipped, and a duplicate rejected by the store
//! is counted the same way. Diffusions from earlier runs are never modified.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{ApprovalMode, EngineConfig};
use crate::error::{Result, StoreError};
use crate::generator;
use crate::model::{Diffusion, DiffusionType, NewDiffusion, Program, Schedule};
use crate::month::YearMonth;
use crate::rerun;
use crate::store::DiffusionStore;

/// Outcome of one or more materialization runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializeReport {
    /// Diffusions inserted by this run, in insertion order.
    pub created: Vec<Diffusion>,
    /// Occurrences that already had a diffusion.
    pub skipped: usize,
    /// Rerun occurrences for which no original broadcast was found. They are
    /// materialized with no `initial`.
    pub orphaned: Vec<DateTime<Utc>>,
}

impl MaterializeReport {
    pub fn unconfirmed(&self) -> usize {
        self.created
            .iter()
            .filter(|d| d.kind == DiffusionType::Unconfirmed)
            .count()
    }
}

pub struct Materializer<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
}

impl<'a> Materializer<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Create the missing diffusions of `schedule` for `month`.
    ///
    /// `now` decides which occurrences count as late imports; it is never read
    /// from the system clock.
    ///
    /// # Errors
    /// Configuration errors (unknown program, bad timezone, invalid rerun link,
    /// invalid grace window) are returned before anything is written. Store
    /// errors other than duplicates abort the run and are returned unmodified.
    pub fn materialize(
        &self,
        store: &mut impl DiffusionStore,
        schedule: &Schedule,
        month: YearMonth,
        now: DateTime<Utc>,
    ) -> Result<MaterializeReport> {
        let cutoff = self.config.late_cutoff(now)?;
        let mut report = MaterializeReport::default();
        self.materialize_into(store, schedule, month, cutoff, &mut report)?;
        Ok(report)
    }

    /// Materialize every schedule of every active program for `month`.
    ///
    /// Originals run before reruns so that a rerun can link to an original
    /// created earlier in the same run. The catalog and the grace window are
    /// validated first.
    ///
    /// Diffusions created by the run share one report: when a new diffusion
    /// overlaps one created earlier in the same run, both end up unconfirmed.
    pub fn update_month(
        &self,
        store: &mut impl DiffusionStore,
        month: YearMonth,
        now: DateTime<Utc>,
    ) -> Result<MaterializeReport> {
        self.catalog.validate()?;
        let cutoff = self.config.late_cutoff(now)?;

        let mut report = MaterializeReport::default();
        for schedule in self.catalog.active_schedules() {
            let before = report.created.len();
            self.materialize_into(store, schedule, month, cutoff, &mut report)?;
            let created = report.created.len() - before;
            info!(
                schedule = %schedule.id,
                program = %schedule.program,
                frequency = %schedule.frequency,
                created,
                "{month}: {created} new diffusions"
            );
        }

        info!(
            created = report.created.len(),
            unconfirmed = report.unconfirmed(),
            skipped = report.skipped,
            orphaned = report.orphaned.len(),
            "{month}: update done"
        );
        Ok(report)
    }

    fn materialize_into(
        &self,
        store: &mut impl DiffusionStore,
        schedule: &Schedule,
        month: YearMonth,
        cutoff: DateTime<Utc>,
        report: &mut MaterializeReport,
    ) -> Result<()> {
        self.catalog.validate_schedule(schedule)?;
        let program = self.catalog.program(schedule.program)?;

        if !program.active {
            debug!(schedule = %schedule.id, program = %program.id, "program inactive, nothing to materialize");
            return Ok(());
        }

        for occurrence in generator::dates_for_month(schedule, month, self.config.dst_policy)? {
            let start = occurrence.start;
            if store.find_active(program.id, start)?.is_some() {
                debug!(schedule = %schedule.id, %start, "already materialized");
                report.skipped += 1;
                continue;
            }

            let initial = if schedule.is_rerun() {
                let initial = rerun::resolve_initial(&*store, self.catalog, schedule, start)?;
                if initial.is_none() {
                    warn!(schedule = %schedule.id, %start, "no original broadcast found for rerun");
                    report.orphaned.push(start);
                }
                initial.map(|d| d.id)
            } else {
                None
            };

            let peers = overlapping_peers(&*store, program, start, occurrence.end)?;
            let new = NewDiffusion {
                program: program.id,
                station: program.station,
                schedule: Some(schedule.id),
                start,
                duration_minutes: schedule.duration_minutes,
                kind: self.classify(start, cutoff, !peers.is_empty()),
                initial,
            };

            match store.insert(new) {
                Ok(diffusion) => {
                    flag_peers_of_run(store, &peers, report)?;
                    report.created.push(diffusion);
                }
                Err(StoreError::Duplicate { .. }) => {
                    debug!(schedule = %schedule.id, %start, "store reported duplicate");
                    report.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    fn classify(
        &self,
        start: DateTime<Utc>,
        cutoff: DateTime<Utc>,
        overlaps_other: bool,
    ) -> DiffusionType {
        let unconfirmed = self.config.approval == ApprovalMode::Manual
            || start < cutoff
            || overlaps_other;

        if unconfirmed {
            DiffusionType::Unconfirmed
        } else {
            DiffusionType::Default
        }
    }
}

/// Live diffusions of other programs on the same station overlapping `[start, end)`.
fn overlapping_peers(
    store: &impl DiffusionStore,
    program: &Program,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Diffusion>> {
    Ok(store
        .overlapping(start, end)?
        .into_iter()
        .filter(|d| {
            d.station == program.station
                && d.program != program.id
                && !matches!(d.kind, DiffusionType::Cancel | DiffusionType::Stop)
        })
        .collect())
}

/// Mark `default` peers created earlier in this run as unconfirmed. Peers
/// from previous runs are left as they are.
fn flag_peers_of_run(
    store: &mut impl DiffusionStore,
    peers: &[Diffusion],
    report: &mut MaterializeReport,
) -> Result<()> {
    for peer in peers.iter().filter(|p| p.kind == DiffusionType::Default) {
        if let Some(created) = report.created.iter_mut().find(|d| d.id == peer.id) {
            debug!(diffusion = %peer.id, "overlapped later in the run, now unconfirmed");
            *created = store.set_type(peer.id, DiffusionType::Unconfirmed)?;
        }
    }
    Ok(())
}
