//! Zero-copy viewport data bridge for the virtualized renderer.
//!
//! The renderer asks for a window of cells once per frame. Instead of
//! serializing a view object per cell, interesting cells are packed into flat
//! arrays that JavaScript reads straight out of wasm memory through typed
//! arrays. Cells with no text and no highlight are left out; the renderer
//! draws them blank.

use gridpad_core::CellView;

/// Packed cell state flags (4 bytes / u32)
///
/// Bit layout:
/// - Bit 0: inside the selection
/// - Bit 1: selection anchor
/// - Bit 2: editor open on this cell
/// - Bits 3-31: reserved
#[inline]
pub fn pack_flags(selected: bool, anchor: bool, editing: bool) -> u32 {
    let mut flags: u32 = 0;
    if selected {
        flags |= 1 << 0;
    }
    if anchor {
        flags |= 1 << 1;
    }
    if editing {
        flags |= 1 << 2;
    }
    flags
}

/// Unpack state flags back to (selected, anchor, editing)
#[inline]
pub fn unpack_flags(flags: u32) -> (bool, bool, bool) {
    (
        flags & (1 << 0) != 0,
        flags & (1 << 1) != 0,
        flags & (1 << 2) != 0,
    )
}

/// Reusable flat buffer of visible cells
#[derive(Default)]
pub struct ViewportBuffer {
    /// Row indices for each cell
    pub rows: Vec<u32>,
    /// Column indices for each cell
    pub cols: Vec<u32>,
    /// Packed state flags
    pub flags: Vec<u32>,
    /// Text to draw (strings still go through JSON)
    pub texts: Vec<String>,
}

impl ViewportBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
            texts: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.cols.clear();
        self.flags.clear();
        self.texts.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Push a cell view, skipping blank unhighlighted cells.
    /// Returns true if the cell was stored.
    pub fn push_view(&mut self, view: CellView) -> bool {
        let flags = pack_flags(view.selected, view.anchor, view.editing);
        if flags == 0 && view.text.is_empty() {
            return false;
        }
        self.rows.push(view.row as u32);
        self.cols.push(view.col as u32);
        self.flags.push(flags);
        self.texts.push(view.text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(row: usize, col: usize, selected: bool, text: &str) -> CellView {
        CellView {
            row,
            col,
            selected,
            anchor: false,
            editing: false,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_pack_unpack_flags() {
        let flags = pack_flags(true, false, true);
        assert_eq!(flags, 0b101);
        assert_eq!(unpack_flags(flags), (true, false, true));
        assert_eq!(unpack_flags(pack_flags(false, true, false)), (false, true, false));
    }

    #[test]
    fn test_viewport_buffer_skips_blank_cells() {
        let mut buf = ViewportBuffer::with_capacity(4);
        assert!(buf.is_empty());

        assert!(!buf.push_view(view(0, 0, false, "")));
        assert!(buf.push_view(view(0, 1, false, "text")));
        assert!(buf.push_view(view(2, 3, true, "")));

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.rows, vec![0, 2]);
        assert_eq!(buf.cols, vec![1, 3]);
        assert_eq!(buf.flags, vec![0, 1]);
        assert_eq!(buf.texts, vec!["text".to_string(), String::new()]);

        buf.clear();
        assert!(buf.is_empty());
    }
}
