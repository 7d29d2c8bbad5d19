//! Tab/newline text exchange between the cell store and the system clipboard.
//!
//! Rows are joined with `\n` and fields with `\t`, which is what spreadsheet
//! applications put on the clipboard for a rectangular copy.

use crate::error::ClipboardError;
use crate::position::{CellPosition, CellRange};
use crate::store::CellStore;

/// Source and sink of clipboard text
pub trait ClipboardBackend {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard, used natively and in tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.text.clone().ok_or(ClipboardError::NonText)
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

/// Render the cells of `range` as tab-separated rows. Empty cells become `""`.
pub fn serialize_range(store: &CellStore, range: CellRange) -> String {
    let mut text = String::new();
    for (r_index, row) in range.rows().enumerate() {
        if r_index > 0 {
            text.push('\n');
        }
        for (c_index, col) in range.cols().enumerate() {
            if c_index > 0 {
                text.push('\t');
            }
            text.push_str(store.display(row, col));
        }
    }
    text
}

/// Split clipboard text into rows of fields
pub fn parse_rows(text: &str) -> Vec<Vec<&str>> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| line.split('\t').collect())
        .collect()
}

/// Write clipboard text into the store with its first field at `origin`.
///
/// Every field is written, empty ones included, overwriting whatever was
/// there. Fields that would land past `last` (the bottom-right cell of the
/// grid) are dropped. Returns the rectangle that received data.
pub fn deserialize_into(
    store: &mut CellStore,
    text: &str,
    origin: CellPosition,
    last: CellPosition,
) -> CellRange {
    let mut bottom_right = origin;
    for (r_offset, fields) in parse_rows(text).iter().enumerate() {
        let Some(row) = origin.row.checked_add(r_offset).filter(|row| *row <= last.row) else {
            break;
        };
        for (c_offset, value) in fields.iter().enumerate() {
            let Some(col) = origin.col.checked_add(c_offset).filter(|col| *col <= last.col) else {
                break;
            };
            store.set(row, col, *value);
            bottom_right.row = bottom_right.row.max(row);
            bottom_right.col = bottom_right.col.max(col);
        }
    }
    CellRange::new(origin, bottom_right)
}
