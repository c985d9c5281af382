//! [`GridLayout`]: columns × rows of equally sized atlas cells.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rect::UvRect;

// ---------------------------------------------------------------------------
// GridError
// ---------------------------------------------------------------------------

/// Errors returned when building or addressing a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// Columns and rows must both be at least 1.
    #[error("grid dimensions must be >= 1 (got {columns}x{rows})")]
    ZeroDimension {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },

    /// More submeshes or textures than the grid has cells.
    #[error("grid overflow: {count} entries do not fit in {capacity} cells")]
    Overflow {
        /// Number of entries the caller asked to place.
        count: usize,
        /// Number of cells in the grid.
        capacity: usize,
    },
}

// ---------------------------------------------------------------------------
// CellCoord
// ---------------------------------------------------------------------------

/// Column and row of one cell. Row 0 is the bottom row in UV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub column: u32,
    pub row: u32,
}

// ---------------------------------------------------------------------------
// GridLayout
// ---------------------------------------------------------------------------

/// Row-major grid of atlas cells: `t = row * columns + column`.
///
/// Always at least 1×1; construct through [`GridLayout::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridLayout {
    columns: u32,
    rows: u32,
}

impl<'de> Deserialize<'de> for GridLayout {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Dims {
            columns: u32,
            rows: u32,
        }

        let dims = Dims::deserialize(deserializer)?;
        Self::new(dims.columns, dims.rows).map_err(serde::de::Error::custom)
    }
}

impl GridLayout {
    /// Creates a grid, rejecting zero columns or rows.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::ZeroDimension { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells (`columns * rows`).
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Size of one cell in normalized UV space.
    pub fn cell_step(&self) -> Vec2 {
        Vec2::new(1.0 / self.columns as f32, 1.0 / self.rows as f32)
    }

    /// Maps a linear cell index to its column and row.
    ///
    /// Indices past [`cell_count`](Self::cell_count) map to rows beyond the
    /// grid; callers check capacity first.
    pub fn cell(&self, t: usize) -> CellCoord {
        let columns = self.columns as usize;
        CellCoord {
            column: (t % columns) as u32,
            row: (t / columns) as u32,
        }
    }

    /// Lower-left corner of cell `t` in UV space.
    pub fn offset(&self, t: usize) -> Vec2 {
        let cell = self.cell(t);
        Vec2::new(
            cell.column as f32 / self.columns as f32,
            cell.row as f32 / self.rows as f32,
        )
    }

    /// UV rectangle covered by cell `t`.
    ///
    /// The far edge is computed from the next column/row index rather than
    /// `offset + step`, so neighbouring cells share bit-identical edges and the
    /// last column or row ends exactly at 1.0.
    pub fn cell_rect(&self, t: usize) -> UvRect {
        let cell = self.cell(t);
        UvRect::new(
            self.offset(t),
            Vec2::new(
                (cell.column + 1) as f32 / self.columns as f32,
                (cell.row + 1) as f32 / self.rows as f32,
            ),
        )
    }

    /// Remaps a source UV into cell `t`: wrap into `[0, 1)`, scale by the
    /// cell step, then move to the cell's offset.
    ///
    /// The result always lies inside the half-open [`cell_rect`](Self::cell_rect);
    /// sums that round onto the far edge are pulled back by one ulp.
    pub fn remap_uv(&self, uv: Vec2, t: usize) -> Vec2 {
        let rect = self.cell_rect(t);
        let wrapped = Vec2::new(wrap_unit(uv.x), wrap_unit(uv.y));
        let remapped = wrapped * self.cell_step() + rect.min;
        Vec2::new(
            remapped.x.min(below(rect.max.x)),
            remapped.y.min(below(rect.max.y)),
        )
    }

    /// Fails with [`GridError::Overflow`] when `count` entries do not fit.
    pub fn check_capacity(&self, count: usize) -> Result<(), GridError> {
        let capacity = self.cell_count();
        if count > capacity {
            return Err(GridError::Overflow { count, capacity });
        }
        Ok(())
    }

    /// Cell indices as they appear in the finished image, top row first.
    ///
    /// UV row 0 sits at the bottom of the texture, so the first returned row
    /// holds the highest grid row.
    pub fn preview_rows(&self) -> Vec<Vec<usize>> {
        let columns = self.columns as usize;
        (0..self.rows as usize)
            .rev()
            .map(|row| (0..columns).map(|column| row * columns + column).collect())
            .collect()
    }
}

/// Largest `f32` strictly below a positive `v`.
fn below(v: f32) -> f32 {
    f32::from_bits(v.to_bits() - 1)
}

/// Floating-point modulo into `[0, 1)`.
///
/// `1.0` and other whole numbers wrap to `0.0`. Tiny negative inputs whose
/// fractional part rounds up to 1.0 are folded back to 0.0.
pub fn wrap_unit(v: f32) -> f32 {
    let r = v - v.floor();
    if r >= 1.0 { 0.0 } else { r }
}
