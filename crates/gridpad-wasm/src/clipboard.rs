use gridpad_core::{ClipboardBackend, ClipboardError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{ClipboardEvent, DataTransfer, Event};

const TEXT_PLAIN: &str = "text/plain";

/// Clipboard backed by the `DataTransfer` of a `copy`/`paste` event.
///
/// Reading and writing through the event is synchronous and needs no
/// clipboard permission, unlike `navigator.clipboard`.
pub struct EventClipboard {
    data: Option<DataTransfer>,
}

impl EventClipboard {
    pub fn from_event(event: &Event) -> Self {
        let data = event
            .dyn_ref::<ClipboardEvent>()
            .and_then(|event| event.clipboard_data());
        Self { data }
    }

    fn data(&self) -> Result<&DataTransfer, ClipboardError> {
        self.data.as_ref().ok_or(ClipboardError::Unavailable)
    }
}

pub(crate) fn js_error_message(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{err:?}"))
}

fn has_text(data: &DataTransfer) -> bool {
    data.types()
        .iter()
        .any(|kind| kind.as_string().as_deref() == Some(TEXT_PLAIN))
}

impl ClipboardBackend for EventClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let data = self.data()?;
        if !has_text(data) {
            return Err(ClipboardError::NonText);
        }
        data.get_data(TEXT_PLAIN)
            .map_err(|err| ClipboardError::PermissionDenied(js_error_message(&err)))
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.data()?
            .set_data(TEXT_PLAIN, text)
            .map_err(|err| ClipboardError::Backend(js_error_message(&err)))
    }
}
