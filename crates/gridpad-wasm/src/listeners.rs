//! Document-level listeners scoped to a mounted grid.
//!
//! `copy`, `paste`, `keydown` and `keyup` are observed on the document and
//! `blur` on the window. The listeners live exactly as long as the returned
//! [`GridListeners`]; dropping it (or calling `unmount`) removes them, so
//! several grids can mount and unmount without leaking handlers.

use std::cell::RefCell;
use std::rc::Rc;

use gridpad_core::{GridState, Key, KeyOrigin};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent};

use crate::api::ChangeNotifier;
use crate::clipboard::EventClipboard;

type Handler = Closure<dyn FnMut(Event)>;

/// Live listener registrations for one mounted grid
#[wasm_bindgen]
pub struct GridListeners {
    registrations: Vec<(EventTarget, &'static str, Handler)>,
}

/// True when a text field (the cell editor or any other input) owns the event
fn from_text_field(event: &Event) -> bool {
    event.target().is_some_and(|target| {
        target.is_instance_of::<HtmlInputElement>() || target.is_instance_of::<HtmlTextAreaElement>()
    })
}

fn key_of(event: &Event) -> Option<Key> {
    event
        .dyn_ref::<KeyboardEvent>()
        .map(|event| Key::from_dom(&event.key()))
}

impl GridListeners {
    pub(crate) fn attach(
        state: Rc<RefCell<GridState>>,
        notifier: ChangeNotifier,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let document: EventTarget = document.into();
        let window: EventTarget = window.into();

        let mut listeners = Self {
            registrations: Vec::with_capacity(5),
        };

        let s = state.clone();
        listeners.register(&document, "keydown", move |event| {
            if from_text_field(&event) {
                return;
            }
            let Some(key) = key_of(&event) else { return };
            // Stops arrow keys from scrolling the page
            if s.borrow_mut().key_down(&key, KeyOrigin::Document) {
                event.prevent_default();
            }
        })?;

        let (s, n) = (state.clone(), notifier.clone());
        listeners.register(&document, "keyup", move |event| {
            if from_text_field(&event) {
                return;
            }
            let Some(key) = key_of(&event) else { return };
            let changed = s.borrow_mut().key_up(&key, KeyOrigin::Document);
            if changed {
                n.notify();
            }
        })?;

        let s = state.clone();
        listeners.register(&document, "copy", move |event| {
            if from_text_field(&event) {
                return;
            }
            let mut clipboard = EventClipboard::from_event(&event);
            let result = s.borrow().copy(&mut clipboard);
            match result {
                Ok(_) => event.prevent_default(),
                Err(err) => web_sys::console::warn_1(&format!("gridpad: copy failed: {err}").into()),
            }
        })?;

        let (s, n) = (state.clone(), notifier);
        listeners.register(&document, "paste", move |event| {
            if from_text_field(&event) {
                return;
            }
            let mut clipboard = EventClipboard::from_event(&event);
            let result = s.borrow_mut().paste(&mut clipboard);
            match result {
                Ok(_) => {
                    event.prevent_default();
                    n.notify();
                }
                Err(err) => {
                    web_sys::console::warn_1(&format!("gridpad: paste failed: {err}").into())
                }
            }
        })?;

        listeners.register(&window, "blur", move |_| {
            state.borrow_mut().reset_keys();
        })?;

        Ok(listeners)
    }

    fn register(
        &mut self,
        target: &EventTarget,
        name: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let closure: Handler = Closure::new(handler);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.registrations.push((target.clone(), name, closure));
        Ok(())
    }

    fn detach(&mut self) {
        for (target, name, closure) in self.registrations.drain(..) {
            if let Err(err) =
                target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            {
                web_sys::console::warn_1(&err);
            }
        }
    }
}

#[wasm_bindgen]
impl GridListeners {
    /// Remove every listener registered at mount
    pub fn unmount(mut self) {
        self.detach();
    }

    #[wasm_bindgen(getter, js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        !self.registrations.is_empty()
    }
}

impl Drop for GridListeners {
    fn drop(&mut self) {
        self.detach();
    }
}
