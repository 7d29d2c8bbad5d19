use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell position in the grid (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub const fn origin() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Offset this position by a signed delta, clamping into `[0, max_row] x [0, max_col]`
    pub fn offset_clamped(self, delta_row: isize, delta_col: isize, max_row: usize, max_col: usize) -> Self {
        Self {
            row: self.row.saturating_add_signed(delta_row).min(max_row),
            col: self.col.saturating_add_signed(delta_col).min(max_col),
        }
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A rectangle of cells described by an anchor and a free end.
///
/// The two corners are stored as given; every query normalizes them, so a
/// range dragged up-and-left behaves the same as one dragged down-and-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellPosition,
    pub end: CellPosition,
}

impl CellRange {
    pub fn new(start: CellPosition, end: CellPosition) -> Self {
        Self { start, end }
    }

    pub fn single_cell(pos: CellPosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns the normalized range (top-left to bottom-right)
    pub fn normalize(&self) -> Self {
        Self {
            start: CellPosition::new(
                self.start.row.min(self.end.row),
                self.start.col.min(self.end.col),
            ),
            end: CellPosition::new(
                self.start.row.max(self.end.row),
                self.start.col.max(self.end.col),
            ),
        }
    }

    /// Check if a position is within this range
    pub fn contains(&self, pos: CellPosition) -> bool {
        let normalized = self.normalize();
        pos.row >= normalized.start.row
            && pos.row <= normalized.end.row
            && pos.col >= normalized.start.col
            && pos.col <= normalized.end.col
    }

    pub fn top_left(&self) -> CellPosition {
        self.normalize().start
    }

    pub fn bottom_right(&self) -> CellPosition {
        self.normalize().end
    }

    pub fn row_count(&self) -> usize {
        let normalized = self.normalize();
        normalized.end.row - normalized.start.row + 1
    }

    pub fn col_count(&self) -> usize {
        let normalized = self.normalize();
        normalized.end.col - normalized.start.col + 1
    }

    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// Row indices covered by the range, top to bottom
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        let normalized = self.normalize();
        normalized.start.row..=normalized.end.row
    }

    /// Column indices covered by the range, left to right
    pub fn cols(&self) -> std::ops::RangeInclusive<usize> {
        let normalized = self.normalize();
        normalized.start.col..=normalized.end.col
    }

    /// Iterate every position in row-major order
    pub fn positions(&self) -> impl Iterator<Item = CellPosition> {
        let cols = self.cols();
        self.rows()
            .flat_map(move |row| cols.clone().map(move |col| CellPosition::new(row, col)))
    }
}
