//! Core state for gridpad, a virtualized spreadsheet-style grid.
//!
//! The crate has no UI dependencies. A renderer asks [`GridState`] for
//! [`CellView`]s and forwards mouse, keyboard, editor and clipboard events to
//! it; the `gridpad-wasm` crate does this for the browser.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod position;
pub mod state;
pub mod store;

pub use clipboard::{deserialize_into, serialize_range, ClipboardBackend, MemoryClipboard};
pub use config::{EditSwitch, GridConfig, SizePattern};
pub use error::{ClipboardError, GridError, Result};
pub use position::{CellPosition, CellRange};
pub use state::{
    CellView, EditSession, GridAction, GridState, Key, KeyBinding, KeyOrigin, KeyboardController,
    Selection, ViewportState, VisibleRange,
};
pub use store::{CellRecord, CellStore};
