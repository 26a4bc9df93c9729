//! Play-field geometry
//!
//! The viewport is a `width` x `height` rectangle in grid units. The top
//! `header` rows are reserved for score/title text, so the playable
//! sub-rectangle is `x in [0, width)`, `y in [header, height)`. All edges are
//! multiples of `grid_size`.

use serde::{Deserialize, Serialize};

use super::state::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub grid_size: i32,
    pub width: i32,
    pub height: i32,
    pub header: i32,
}

impl Bounds {
    /// Align a raw viewport to the grid. Width and height are floored to the
    /// grid, the header band is rounded up so it never overlaps a playable row.
    pub fn from_viewport(width: i32, height: i32, header: i32, grid_size: i32) -> Self {
        let grid_size = grid_size.max(1);
        let floor = |v: i32| v.max(0) / grid_size * grid_size;
        let ceil = |v: i32| v.max(0).saturating_add(grid_size - 1) / grid_size * grid_size;

        Self {
            grid_size,
            width: floor(width),
            height: floor(height),
            header: ceil(header),
        }
    }

    /// Viewport sized in whole cells, header given in cells as well
    pub fn from_cells(columns: i32, rows: i32, header_rows: i32, grid_size: i32) -> Self {
        Self::from_viewport(
            columns.saturating_mul(grid_size),
            rows.saturating_add(header_rows).saturating_mul(grid_size),
            header_rows.saturating_mul(grid_size),
            grid_size,
        )
    }

    /// Number of playable columns
    pub fn columns(&self) -> i32 {
        self.width / self.grid_size
    }

    /// Number of playable rows (header excluded)
    pub fn rows(&self) -> i32 {
        ((self.height - self.header) / self.grid_size).max(0)
    }

    /// Rows taken by the header band
    pub fn header_rows(&self) -> i32 {
        self.header / self.grid_size
    }

    pub fn cell_count(&self) -> usize {
        (self.columns().max(0) as usize) * (self.rows() as usize)
    }

    pub fn is_playable(&self) -> bool {
        self.cell_count() > 0
    }

    /// Position of the playable cell at (`column`, `row`)
    pub fn cell(&self, column: i32, row: i32) -> Position {
        Position::new(column * self.grid_size, self.header + row * self.grid_size)
    }

    /// True if `pos` lies in the playable sub-rectangle
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= self.header && pos.y < self.height
    }

    /// Map a position that left the field on either axis onto the opposite
    /// edge of the playable sub-rectangle
    pub fn wrap(&self, pos: Position) -> Position {
        let x = if pos.x >= self.width {
            0
        } else if pos.x < 0 {
            self.width - self.grid_size
        } else {
            pos.x
        };

        let y = if pos.y >= self.height {
            self.header
        } else if pos.y < self.header {
            self.height - self.grid_size
        } else {
            pos.y
        };

        Position::new(x, y)
    }

    /// Every playable cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows()).flat_map(move |row| (0..self.columns()).map(move |col| self.cell(col, row)))
    }
}
