//! Entity proxies observed by the grid
//!
//! The grid never owns entity state. It keeps a cheap clonable handle per
//! entity and learns about movement through [`MoveListener`]s the entity calls
//! whenever its position changes.

use glam::Vec2;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;

/// Opaque entity identity
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Hands out sequential entity ids, starting at 1.
pub struct EntityIdAllocator {
    next_id: u64,
}

impl EntityIdAllocator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-unique identity of a grid, used to match subscriptions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GridId(u64);

impl GridId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Move-notification endpoint a grid hands to each entity it observes.
#[derive(Debug, Clone)]
pub struct MoveListener {
    grid: GridId,
    sender: Sender<EntityId>,
}

impl MoveListener {
    pub(crate) fn new(grid: GridId, sender: Sender<EntityId>) -> Self {
        Self { grid, sender }
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    /// Report that `entity` moved. Returns `false` once the grid is gone, so
    /// the caller can drop the listener.
    pub fn notify(&self, entity: EntityId) -> bool {
        self.sender.send(entity).is_ok()
    }
}

/// What the grid needs from an entity.
///
/// Implementors are handles: cloning one must yield another view of the same
/// entity, not a copy of its state.
pub trait EntityProxy: Clone {
    fn id(&self) -> EntityId;

    fn position(&self) -> Vec2;

    fn radius(&self) -> f32;

    /// Start reporting moves to `listener`. A second listener for the same grid
    /// replaces the first.
    fn subscribe(&self, listener: MoveListener);

    /// Stop reporting moves to the given grid.
    fn unsubscribe(&self, grid: GridId);
}

/// Reference single-threaded entity proxy: a point with a radius.
///
/// Moves are reported only when the position actually changes.
#[derive(Debug, Clone)]
pub struct GridEntity {
    inner: Rc<EntityState>,
}

#[derive(Debug)]
struct EntityState {
    id: EntityId,
    position: Cell<Vec2>,
    radius: Cell<f32>,
    listeners: RefCell<Vec<MoveListener>>,
}

impl GridEntity {
    pub fn new(id: EntityId, position: Vec2, radius: f32) -> Self {
        Self {
            inner: Rc::new(EntityState {
                id,
                position: Cell::new(position),
                radius: Cell::new(sanitize_radius(radius)),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn set_position(&self, position: Vec2) {
        if self.inner.position.get() == position {
            return;
        }
        self.inner.position.set(position);
        self.notify_moved();
    }

    pub fn translate(&self, delta: Vec2) {
        self.set_position(self.inner.position.get() + delta);
    }

    /// Radius does not affect the cell, so no notification is sent.
    pub fn set_radius(&self, radius: f32) {
        self.inner.radius.set(sanitize_radius(radius));
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn notify_moved(&self) {
        let id = self.inner.id;
        self.inner
            .listeners
            .borrow_mut()
            .retain(|listener| listener.notify(id));
    }
}

impl EntityProxy for GridEntity {
    fn id(&self) -> EntityId {
        self.inner.id
    }

    fn position(&self) -> Vec2 {
        self.inner.position.get()
    }

    fn radius(&self) -> f32 {
        self.inner.radius.get()
    }

    fn subscribe(&self, listener: MoveListener) {
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.retain(|l| l.grid() != listener.grid());
        listeners.push(listener);
    }

    fn unsubscribe(&self, grid: GridId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|l| l.grid() != grid);
    }
}

fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() {
        radius.max(0.0)
    } else {
        0.0
    }
}
