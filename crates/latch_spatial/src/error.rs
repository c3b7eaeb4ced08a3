use glam::{UVec2, Vec2};
use thiserror::Error;

/// Errors raised while building a grid. Grid operations themselves never fail.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("cell counts must be positive on both axes, got {counts}")]
    EmptyCellCount { counts: UVec2 },

    #[error("grid of {counts} cells cannot be addressed")]
    TooManyCells { counts: UVec2 },

    #[error("grid extent must be positive and finite on both axes, got {extent}")]
    InvalidExtent { extent: Vec2 },

    #[error("extent {extent} split into {counts} cells leaves zero-sized cells")]
    DegenerateCellSize { extent: Vec2, counts: UVec2 },

    #[error("grid origin must be finite, got {origin}")]
    InvalidOrigin { origin: Vec2 },

    #[error("failed to parse grid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
