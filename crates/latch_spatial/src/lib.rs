//! Latch Spatial
//!
//! Uniform 2D spatial hashing grid for the simulation layer:
//! - Cell-coordinate math over a fixed, bounded world rectangle
//! - Incremental bucket migration driven by entity move notifications
//! - Lazy axis-aligned range queries with caller filters
//!
//! The grid is single-threaded: entity handles share state through `Rc`, so
//! neither they nor a grid holding them can cross threads.

pub mod bucket;
pub mod cell;
pub mod config;
pub mod entity;
pub mod error;
pub mod grid;
pub mod math;
pub mod metrics;
pub mod query;

pub use glam;

pub use cell::{CellCoord, CellLayout, CellRect};
pub use config::GridConfig;
pub use entity::{EntityId, EntityIdAllocator, EntityProxy, GridEntity, GridId, MoveListener};
pub use error::ConfigurationError;
pub use grid::SpatialGrid;
pub use metrics::{GridCounters, GridEvent};
pub use query::{AabbQuery, Query, SpatialQuery};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
