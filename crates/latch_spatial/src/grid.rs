// grid.rs - uniform spatial grid with incremental bucket migration
//
// An entity lives in at most one bucket: the cell its center was in the last
// time it was updated. `last_cell` holds exactly the entities present in some
// bucket, so the two are always changed together.

use crate::bucket::Buckets;
use crate::cell::{CellCoord, CellLayout};
use crate::config::GridConfig;
use crate::entity::{EntityId, EntityProxy, GridId, MoveListener};
use crate::error::ConfigurationError;
use crate::metrics::{GridCounters, GridEvent};
use glam::{UVec2, Vec2};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

/// Fixed-size 2D grid of entity buckets.
///
/// Entities are observed, not owned: the grid keeps one handle per entity and
/// is told about movement through the entity's move notifications.
///
/// # Example
/// ```ignore
/// let mut grid = SpatialGrid::new(Vec2::ZERO, Vec2::splat(100.0), UVec2::new(10, 10))?;
/// let player = GridEntity::new(ids.allocate(), Vec2::new(12.0, 40.0), 1.5);
/// grid.add_entity(&player);
///
/// player.translate(Vec2::new(15.0, 0.0));
/// grid.process_moves();
///
/// let near: Vec<_> = grid.query_all(Vec2::new(20.0, 30.0), Vec2::new(35.0, 50.0)).collect();
/// ```
pub struct SpatialGrid<H> {
    id: GridId,
    layout: CellLayout,
    buckets: Buckets<H>,
    last_cell: HashMap<EntityId, CellCoord>,
    observed: HashMap<EntityId, H>,
    moves_tx: Sender<EntityId>,
    moves_rx: Receiver<EntityId>,
    counters: GridCounters,
}

impl<H: EntityProxy> SpatialGrid<H> {
    /// Create an empty grid covering `origin .. origin + extent` with
    /// `cell_counts` cells per axis.
    pub fn new(origin: Vec2, extent: Vec2, cell_counts: UVec2) -> Result<Self, ConfigurationError> {
        let layout = CellLayout::new(origin, extent, cell_counts)?;
        Ok(Self::with_layout(layout))
    }

    pub fn from_config(config: &GridConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::with_layout(config.layout()?))
    }

    fn with_layout(layout: CellLayout) -> Self {
        let (moves_tx, moves_rx) = mpsc::channel();
        let id = GridId::next();
        tracing::debug!(
            "grid {}: {} cells of {} covering {}..{}",
            id.id(),
            layout.counts(),
            layout.cell_size(),
            layout.origin(),
            layout.end()
        );

        Self {
            id,
            buckets: Buckets::new(layout.cell_count()),
            layout,
            last_cell: HashMap::new(),
            observed: HashMap::new(),
            moves_tx,
            moves_rx,
            counters: GridCounters::new(),
        }
    }

    /// Start observing `entity` and place it in its current cell.
    pub fn add_entity(&mut self, entity: &H) {
        let id = entity.id();
        entity.subscribe(MoveListener::new(self.id, self.moves_tx.clone()));
        self.observed.insert(id, entity.clone());
        self.counters.increment(GridEvent::Registered);
        self.update_entity(entity);

        tracing::debug!(
            "grid {}: added entity {} in cell {}",
            self.id.id(),
            id.id(),
            self.cell_of_entity(id).unwrap_or(CellCoord::OUTSIDE)
        );
    }

    /// Stop observing `entity` and drop its bucket membership.
    ///
    /// The entity itself is untouched. Removing an entity that was never added
    /// only unsubscribes it.
    pub fn remove_entity(&mut self, entity: &H) {
        let id = entity.id();
        let prev = self.last_cell.remove(&id).unwrap_or(CellCoord::OUTSIDE);
        if let Some(index) = self.layout.index_of(prev) {
            self.buckets.remove(index, id);
        }
        entity.unsubscribe(self.id);

        if self.observed.remove(&id).is_some() {
            self.counters.increment(GridEvent::Removed);
            tracing::debug!("grid {}: removed entity {} from cell {}", self.id.id(), id.id(), prev);
        }
    }

    /// Recompute the entity's cell and migrate it between buckets if it
    /// crossed a cell boundary. A no-op while the cell is unchanged.
    ///
    /// An entity that was never added is treated as previously outside: it is
    /// placed in its bucket (and becomes queryable) but is not subscribed.
    pub fn update_entity(&mut self, entity: &H) {
        let id = entity.id();
        let prev = self.last_cell.get(&id).copied().unwrap_or(CellCoord::OUTSIDE);
        let cur = self.layout.cell_of(entity.position());

        if prev == cur {
            return;
        }

        let prev_index = self.layout.index_of(prev);
        if let Some(index) = prev_index {
            self.buckets.remove(index, id);
        }

        match self.layout.index_of(cur) {
            Some(index) => {
                self.buckets.insert(index, id, entity.clone());
                self.last_cell.insert(id, cur);
                self.counters.increment(GridEvent::CellCrossing);
                tracing::trace!("grid {}: entity {} {} -> {}", self.id.id(), id.id(), prev, cur);
            }
            None => {
                self.last_cell.remove(&id);
                if prev_index.is_some() {
                    self.counters.increment(GridEvent::Evicted);
                    tracing::trace!("grid {}: entity {} left the grid from {}", self.id.id(), id.id(), prev);
                }
            }
        }
    }

    /// Apply every move notification received since the last call.
    ///
    /// Notifications from entities that have since been removed are dropped.
    /// Returns the number of notifications applied.
    pub fn process_moves(&mut self) -> usize {
        let moved: Vec<EntityId> = self.moves_rx.try_iter().collect();
        let mut applied = 0;
        for id in moved {
            let Some(entity) = self.observed.get(&id).cloned() else {
                continue;
            };
            self.update_entity(&entity);
            applied += 1;
        }
        applied
    }

    /// Polling alternative to [`process_moves`](Self::process_moves): update
    /// every observed entity regardless of notifications, then discard any
    /// pending notifications.
    pub fn refresh(&mut self) {
        let entities: Vec<H> = self.observed.values().cloned().collect();
        for entity in &entities {
            self.update_entity(entity);
        }
        self.moves_rx.try_iter().for_each(drop);
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn layout(&self) -> &CellLayout {
        &self.layout
    }

    pub fn origin(&self) -> Vec2 {
        self.layout.origin()
    }

    /// Far corner, `origin + extent`.
    pub fn end(&self) -> Vec2 {
        self.layout.end()
    }

    pub fn extent(&self) -> Vec2 {
        self.layout.extent()
    }

    pub fn cell_size(&self) -> Vec2 {
        self.layout.cell_size()
    }

    pub fn cell_counts(&self) -> UVec2 {
        self.layout.counts().as_uvec2()
    }

    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        self.layout.cell_of(position)
    }

    pub fn inside_grid(&self, coord: CellCoord) -> bool {
        self.layout.inside(coord)
    }

    /// Number of entities currently in some bucket.
    pub fn len(&self) -> usize {
        self.last_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_cell.is_empty()
    }

    /// Number of entities whose move notifications the grid listens to,
    /// inside the bounds or not.
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn is_observing(&self, id: EntityId) -> bool {
        self.observed.contains_key(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.last_cell.contains_key(&id)
    }

    /// Cell the entity is bucketed in, `None` if it is outside or unknown.
    pub fn cell_of_entity(&self, id: EntityId) -> Option<CellCoord> {
        self.last_cell.get(&id).copied()
    }

    /// Ids stored in one cell, ascending. Empty for coordinates outside the grid.
    pub fn bucket(&self, coord: CellCoord) -> Vec<EntityId> {
        match self.layout.index_of(coord) {
            Some(index) => self.buckets.ids(index).collect(),
            None => Vec::new(),
        }
    }

    pub fn counters(&self) -> &GridCounters {
        &self.counters
    }

    pub(crate) fn buckets(&self) -> &Buckets<H> {
        &self.buckets
    }
}
