mod api;
mod clipboard;
mod listeners;
mod viewport;

pub use api::GridEngine;
pub use clipboard::EventClipboard;
pub use listeners::GridListeners;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
