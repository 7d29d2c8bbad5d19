use serde::{Deserialize, Serialize};

use crate::position::{CellPosition, CellRange};

/// The window of cells the virtualized renderer currently has on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

impl VisibleRange {
    pub fn new(first_row: usize, last_row: usize, first_col: usize, last_col: usize) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    pub fn contains(&self, pos: CellPosition) -> bool {
        pos.row >= self.first_row
            && pos.row <= self.last_row
            && pos.col >= self.first_col
            && pos.col <= self.last_col
    }

    /// Window of `rows` x `cols` cells starting at the given corner, cut
    /// to end at `last`. `None` when it is empty or starts past `last`.
    pub fn clipped(
        first_row: usize,
        first_col: usize,
        rows: usize,
        cols: usize,
        last: CellPosition,
    ) -> Option<Self> {
        if rows == 0 || cols == 0 || first_row > last.row || first_col > last.col {
            return None;
        }
        Some(Self::new(
            first_row,
            first_row.saturating_add(rows - 1).min(last.row),
            first_col,
            first_col.saturating_add(cols - 1).min(last.col),
        ))
    }

    pub fn as_range(&self) -> CellRange {
        CellRange::new(
            CellPosition::new(self.first_row, self.first_col),
            CellPosition::new(self.last_row, self.last_col),
        )
    }
}

/// Tracks what the renderer reports as visible and which cell it should
/// scroll to after keyboard navigation.
///
/// Scroll offsets belong to the renderer; this only remembers the last
/// reported window so navigation can ask for a cell to be revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportState {
    visible: Option<VisibleRange>,
    scroll_target: Option<CellPosition>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportState {
    pub fn new() -> Self {
        Self {
            visible: None,
            scroll_target: None,
        }
    }

    /// Record the window rendered after a scroll or resize
    pub fn set_visible(&mut self, range: VisibleRange) {
        if self.scroll_target.is_some_and(|target| range.contains(target)) {
            self.scroll_target = None;
        }
        self.visible = Some(range);
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.visible
    }

    /// Request a scroll if `pos` is outside the last reported window
    pub fn ensure_cell_visible(&mut self, pos: CellPosition) {
        match self.visible {
            Some(range) if range.contains(pos) => self.scroll_target = None,
            _ => self.scroll_target = Some(pos),
        }
    }

    /// Cell the renderer should scroll to, if any. Consumed on read.
    pub fn take_scroll_target(&mut self) -> Option<CellPosition> {
        self.scroll_target.take()
    }

    pub fn is_visible(&self, pos: CellPosition) -> bool {
        self.visible.is_some_and(|range| range.contains(pos))
    }
}
