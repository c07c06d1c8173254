//! Diffusion persistence.
//!
//! The engine reads and writes diffusions through [`DiffusionStore`]. The store
//! owns the at-most-once guarantee: `insert` rejects a second non-cancelled
//! diffusion for the same program and start with [`StoreError::Duplicate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Diffusion, DiffusionId, DiffusionType, NewDiffusion, ProgramId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage contract used by the materializer, the conflict detector and the
/// lifecycle operations.
///
/// Every query returns diffusions ordered by start, then by id.
pub trait DiffusionStore {
    /// Insert a diffusion, assigning the next id.
    ///
    /// Fails with `StoreError::Duplicate` if a non-cancelled diffusion already
    /// exists for the same program and start.
    fn insert(&mut self, new: NewDiffusion) -> StoreResult<Diffusion>;

    fn get(&self, id: DiffusionId) -> StoreResult<Option<Diffusion>>;

    /// The non-cancelled diffusion of `program` starting at `start`, if any.
    fn find_active(&self, program: ProgramId, start: DateTime<Utc>) -> StoreResult<Option<Diffusion>>;

    /// All diffusions of `program`.
    fn for_program(&self, program: ProgramId) -> StoreResult<Vec<Diffusion>>;

    /// Diffusions whose start lies in `[from, to)`.
    fn starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Diffusion>>;

    /// Diffusions whose `[start, end)` interval intersects `[start, end)`.
    fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<Diffusion>>;

    /// Change a diffusion's type.
    fn set_type(&mut self, id: DiffusionId, kind: DiffusionType) -> StoreResult<Diffusion>;
}

/// In-memory store, serializable as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    next_id: u64,
    /// Kept in id order: ids are assigned on append.
    diffusions: Vec<Diffusion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut store: Self = serde_json::from_str(json)?;
        store.diffusions.sort_by_key(|d| d.id);
        // Hand-edited documents may carry ids past the counter.
        let max_id = store.diffusions.last().map_or(0, |d| d.id.0);
        store.next_id = store.next_id.max(max_id);
        Ok(store)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.diffusions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffusions.is_empty()
    }

    /// Every diffusion, ordered by start then id.
    pub fn all(&self) -> Vec<Diffusion> {
        self.collect(|_| true)
    }

    fn position(&self, id: DiffusionId) -> Option<usize> {
        self.diffusions.binary_search_by_key(&id, |d| d.id).ok()
    }

    fn collect(&self, keep: impl Fn(&Diffusion) -> bool) -> Vec<Diffusion> {
        let mut out: Vec<Diffusion> = self.diffusions.iter().filter(|d| keep(d)).cloned().collect();
        out.sort_by_key(|d| (d.start, d.id));
        out
    }
}

impl DiffusionStore for MemoryStore {
    fn insert(&mut self, new: NewDiffusion) -> StoreResult<Diffusion> {
        if new.kind != DiffusionType::Cancel && self.find_active(new.program, new.start)?.is_some() {
            return Err(StoreError::Duplicate {
                program: new.program,
                start: new.start,
            });
        }

        self.next_id += 1;
        let diffusion = new.with_id(DiffusionId(self.next_id));
        self.diffusions.push(diffusion.clone());
        Ok(diffusion)
    }

    fn get(&self, id: DiffusionId) -> StoreResult<Option<Diffusion>> {
        Ok(self.position(id).map(|i| self.diffusions[i].clone()))
    }

    fn find_active(&self, program: ProgramId, start: DateTime<Utc>) -> StoreResult<Option<Diffusion>> {
        Ok(self
            .diffusions
            .iter()
            .find(|d| d.program == program && d.start == start && !d.is_cancelled())
            .cloned())
    }

    fn for_program(&self, program: ProgramId) -> StoreResult<Vec<Diffusion>> {
        Ok(self.collect(|d| d.program == program))
    }

    fn starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Diffusion>> {
        Ok(self.collect(|d| from <= d.start && d.start < to))
    }

    fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<Diffusion>> {
        Ok(self.collect(|d| d.start < end && start < d.end()))
    }

    fn set_type(&mut self, id: DiffusionId, kind: DiffusionType) -> StoreResult<Diffusion> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let diffusion = &mut self.diffusions[index];
        diffusion.kind = kind;
        Ok(diffusion.clone())
    }
}
