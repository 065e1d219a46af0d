//! Child placement on the canvas.
//!
//! Pure coordinate computation: identical inputs always produce identical
//! positions. Positions are read once at node creation and persist until
//! the node is explicitly moved.

use crate::graph::Position;

/// Grid placement for creatives: fixed columns, vertically centred on the parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Offset to the right of the parent.
    pub horizontal_gap: f64,
    /// Distance between columns.
    pub column_spacing: f64,
    /// Distance between rows.
    pub row_spacing: f64,
    /// Columns per row.
    pub columns: usize,
}

/// Single-column placement for personas and angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    /// Offset to the right of the parent.
    pub horizontal_gap: f64,
    /// Distance between consecutive children.
    pub vertical_spacing: f64,
}

/// Creative grid: 3 columns, 350 apart, rows 400 apart, 550 right of the parent.
pub const CREATIVE_GRID: GridLayout = GridLayout {
    horizontal_gap: 550.0,
    column_spacing: 350.0,
    row_spacing: 400.0,
    columns: 3,
};

/// Persona column: 600 right of the parent, 800 apart.
pub const PERSONA_COLUMN: ColumnLayout = ColumnLayout {
    horizontal_gap: 600.0,
    vertical_spacing: 800.0,
};

/// Angle column: 550 right of the parent, 350 apart.
pub const ANGLE_COLUMN: ColumnLayout = ColumnLayout {
    horizontal_gap: 550.0,
    vertical_spacing: 350.0,
};

impl GridLayout {
    /// Grid cell `(column, row)` of the `index`-th child.
    pub fn cell(&self, index: usize) -> (usize, usize) {
        let columns = self.columns.max(1);
        (index % columns, index / columns)
    }

    /// Positions for `count` children of a parent at `parent`.
    ///
    /// The block of rows is centred on `parent.y`; items fill rows left to
    /// right.
    pub fn place(&self, parent: Position, count: usize) -> Vec<Position> {
        if count == 0 {
            return Vec::new();
        }

        let columns = self.columns.max(1);
        let rows = (count + columns - 1) / columns;
        let block_height = (rows - 1) as f64 * self.row_spacing;
        let start_y = parent.y - block_height / 2.0;

        (0..count)
            .map(|index| {
                let (col, row) = self.cell(index);
                Position::new(
                    parent.x + self.horizontal_gap + col as f64 * self.column_spacing,
                    start_y + row as f64 * self.row_spacing,
                )
            })
            .collect()
    }
}

impl ColumnLayout {
    /// Positions for `count` children stacked in one column centred on `parent.y`.
    pub fn place(&self, parent: Position, count: usize) -> Vec<Position> {
        if count == 0 {
            return Vec::new();
        }

        let total_height = (count - 1) as f64 * self.vertical_spacing;
        let start_y = parent.y - total_height / 2.0;
        let x = parent.x + self.horizontal_gap;

        (0..count)
            .map(|index| Position::new(x, start_y + index as f64 * self.vertical_spacing))
            .collect()
    }
}
