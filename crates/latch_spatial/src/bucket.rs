// bucket.rs - per-cell entity sets
//
// One ordered map per cell, flattened column-major. Entries are keyed by id so
// iteration order inside a bucket is deterministic (ascending id), and each
// entry keeps the handle needed to read position and radius during queries.

use crate::entity::EntityId;
use std::collections::{btree_map, BTreeMap};
use std::mem::size_of;

pub struct Buckets<H> {
    cells: Vec<BTreeMap<EntityId, H>>,
}

impl<H> Buckets<H> {
    /// Largest cell count whose bucket array fits in one allocation. The map
    /// header does not depend on `H`.
    pub const MAX_CELLS: usize = isize::MAX as usize / size_of::<BTreeMap<EntityId, ()>>();

    pub fn new(cell_count: usize) -> Self {
        let mut cells = Vec::with_capacity(cell_count);
        cells.resize_with(cell_count, BTreeMap::new);
        Self { cells }
    }

    /// Insert or replace the handle stored under `id` in one cell.
    pub fn insert(&mut self, index: usize, id: EntityId, handle: H) {
        self.cells[index].insert(id, handle);
    }

    pub fn remove(&mut self, index: usize, id: EntityId) -> Option<H> {
        self.cells[index].remove(&id)
    }

    #[cfg(test)]
    pub fn contains(&self, index: usize, id: EntityId) -> bool {
        self.cells[index].contains_key(&id)
    }

    /// Handles in one cell, in ascending id order.
    pub fn iter(&self, index: usize) -> btree_map::Values<'_, EntityId, H> {
        self.cells[index].values()
    }

    pub fn ids(&self, index: usize) -> impl Iterator<Item = EntityId> + '_ {
        self.cells[index].keys().copied()
    }

    #[cfg(test)]
    pub fn len(&self, index: usize) -> usize {
        self.cells[index].len()
    }

    /// Number of cells (not entities).
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total entries across every cell.
    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(BTreeMap::len).sum()
    }
}
