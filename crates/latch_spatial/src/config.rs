//! Grid configuration

use crate::cell::CellLayout;
use crate::error::ConfigurationError;
use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`SpatialGrid`](crate::SpatialGrid)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub origin: Vec2,
    pub extent: Vec2,
    pub cells: UVec2,
}

impl GridConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the parameters without building the bucket array.
    pub fn layout(&self) -> Result<CellLayout, ConfigurationError> {
        CellLayout::new(self.origin, self.extent, self.cells)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            extent: Vec2::new(1024.0, 1024.0),
            cells: UVec2::new(16, 16),
        }
    }
}
