use serde::{Deserialize, Serialize};

use crate::position::{CellPosition, CellRange};

/// The selected rectangle plus the mouse-drag flag.
///
/// `range.start` is the anchor, where the selection began. `range.end` is the
/// free end. Dragging and shift-click only ever move the free end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    range: CellRange,
    dragging: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self {
            range: CellRange::single_cell(CellPosition::origin()),
            dragging: false,
        }
    }

    /// Mouse-down on a cell. With `extend` the anchor stays and only the
    /// free end moves (shift-click); otherwise the selection collapses onto
    /// `pos`. Either way a drag starts.
    pub fn begin(&mut self, pos: CellPosition, extend: bool) {
        if extend {
            self.range.end = pos;
        } else {
            self.range = CellRange::single_cell(pos);
        }
        self.dragging = true;
    }

    /// Mouse-over while dragging moves the free end. Returns false when no
    /// drag is in progress.
    pub fn extend_to(&mut self, pos: CellPosition) -> bool {
        if !self.dragging {
            return false;
        }
        self.range.end = pos;
        true
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Collapse onto a single cell
    pub fn select_cell(&mut self, pos: CellPosition) {
        self.range = CellRange::single_cell(pos);
    }

    /// Move the anchor by a delta and collapse to that single cell, clamped
    /// to `[0, max_row] x [0, max_col]`
    pub fn move_anchor_by(
        &mut self,
        delta_row: isize,
        delta_col: isize,
        max_row: usize,
        max_col: usize,
    ) -> CellPosition {
        let target = self
            .range
            .start
            .offset_clamped(delta_row, delta_col, max_row, max_col);
        self.select_cell(target);
        target
    }

    pub fn is_selected(&self, pos: CellPosition) -> bool {
        self.range.contains(pos)
    }

    pub fn is_anchor(&self, pos: CellPosition) -> bool {
        self.range.start == pos
    }

    pub fn anchor(&self) -> CellPosition {
        self.range.start
    }

    /// The selection as dragged (not normalized)
    pub fn range(&self) -> CellRange {
        self.range
    }

    /// Top-left of the selected rectangle
    pub fn top_left(&self) -> CellPosition {
        self.range.top_left()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
