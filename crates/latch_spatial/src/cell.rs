//! Cell-coordinate math
//!
//! Pure mapping between world positions and integer cell coordinates.
//! Cells are half-open: cell `c` covers `[origin + c * size, origin + (c + 1) * size)`,
//! so a point on the grid's far edge falls outside.

use crate::bucket::Buckets;
use crate::error::ConfigurationError;
use glam::{IVec2, UVec2, Vec2};
use std::fmt;

/// Integer `(col, row)` cell coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub col: i32,
    pub row: i32,
}

impl CellCoord {
    /// Sentinel for "not in any cell". Never a valid bucket index.
    pub const OUTSIDE: CellCoord = CellCoord::new(-1, -1);

    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl From<IVec2> for CellCoord {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<CellCoord> for IVec2 {
    fn from(c: CellCoord) -> Self {
        IVec2::new(c.col, c.row)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Placement of the cell array in world space.
///
/// Holds only the construction inputs; the cell size is always derived from
/// them so the three can never disagree.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CellLayout {
    origin: Vec2,
    extent: Vec2,
    counts: IVec2,
}

impl CellLayout {
    pub fn new(origin: Vec2, extent: Vec2, counts: UVec2) -> Result<Self, ConfigurationError> {
        if counts.x == 0 || counts.y == 0 {
            return Err(ConfigurationError::EmptyCellCount { counts });
        }
        let limit = i32::MAX as u32;
        let addressable = counts.x <= limit
            && counts.y <= limit
            && (counts.x as usize)
                .checked_mul(counts.y as usize)
                .is_some_and(|cells| cells <= Buckets::<()>::MAX_CELLS);
        if !addressable {
            return Err(ConfigurationError::TooManyCells { counts });
        }
        if !extent.is_finite() || extent.x <= 0.0 || extent.y <= 0.0 {
            return Err(ConfigurationError::InvalidExtent { extent });
        }
        let cell_size = extent / counts.as_vec2();
        if !cell_size.is_finite() || cell_size.x <= 0.0 || cell_size.y <= 0.0 {
            return Err(ConfigurationError::DegenerateCellSize { extent, counts });
        }
        if !origin.is_finite() {
            return Err(ConfigurationError::InvalidOrigin { origin });
        }

        Ok(Self {
            origin,
            extent,
            counts: counts.as_ivec2(),
        })
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    /// Far corner of the grid (`origin + extent`).
    pub fn end(&self) -> Vec2 {
        self.origin + self.extent
    }

    pub fn counts(&self) -> IVec2 {
        self.counts
    }

    pub fn cell_size(&self) -> Vec2 {
        self.extent / self.counts.as_vec2()
    }

    pub fn cell_count(&self) -> usize {
        self.counts.x as usize * self.counts.y as usize
    }

    /// Cell containing `position`, using floor (not truncation) so points left
    /// of or below the origin get negative coordinates.
    ///
    /// NaN positions map to [`CellCoord::OUTSIDE`]. Infinite positions, and
    /// finite ones far enough away to overflow `i32`, saturate to
    /// `i32::MIN`/`i32::MAX` per axis, which still lands outside.
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        let scaled = ((position - self.origin) / self.cell_size()).floor();
        if scaled.is_nan() {
            return CellCoord::OUTSIDE;
        }
        CellCoord::new(scaled.x as i32, scaled.y as i32)
    }

    pub fn inside(&self, coord: CellCoord) -> bool {
        0 <= coord.col && coord.col < self.counts.x && 0 <= coord.row && coord.row < self.counts.y
    }

    /// Clamp a coordinate into the valid `[0, counts - 1]` range.
    pub fn clamp(&self, coord: CellCoord) -> CellCoord {
        CellCoord::new(
            coord.col.clamp(0, self.counts.x - 1),
            coord.row.clamp(0, self.counts.y - 1),
        )
    }

    /// Flat bucket index, column-major. `None` for coordinates outside the grid.
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        if !self.inside(coord) {
            return None;
        }
        Some(coord.col as usize * self.counts.y as usize + coord.row as usize)
    }
}

/// Inclusive rectangle of cell coordinates, iterated column-major:
/// columns ascending in the outer loop, rows ascending in the inner one.
#[derive(Debug, Clone)]
pub struct CellRect {
    min: CellCoord,
    max: CellCoord,
    next: Option<CellCoord>,
}

impl CellRect {
    /// Both corners must already be inside the grid; an inverted pair is empty.
    pub fn new(min: CellCoord, max: CellCoord) -> Self {
        let next = (min.col <= max.col && min.row <= max.row).then_some(min);
        Self { min, max, next }
    }

    pub fn empty() -> Self {
        Self {
            min: CellCoord::OUTSIDE,
            max: CellCoord::OUTSIDE,
            next: None,
        }
    }

    fn remaining(&self) -> usize {
        let Some(cur) = self.next else {
            return 0;
        };
        let rows = (self.max.row - self.min.row + 1) as usize;
        let rows_left_in_column = (self.max.row - cur.row + 1) as usize;
        let full_columns_after = (self.max.col - cur.col) as usize;
        rows_left_in_column + full_columns_after * rows
    }
}

impl Iterator for CellRect {
    type Item = CellCoord;

    fn next(&mut self) -> Option<CellCoord> {
        let cur = self.next?;
        self.next = if cur.row < self.max.row {
            Some(CellCoord::new(cur.col, cur.row + 1))
        } else if cur.col < self.max.col {
            Some(CellCoord::new(cur.col + 1, self.min.row))
        } else {
            None
        };
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for CellRect {}
