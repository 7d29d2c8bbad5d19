use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid-level commands a key binding can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Clear the values of every cell in the selection
    ClearSelection,
    /// Open the editor on the anchor cell
    StartEdit,
}

impl GridAction {
    /// Row/column delta for navigation actions
    pub fn move_delta(self) -> Option<(isize, isize)> {
        match self {
            GridAction::MoveUp => Some((-1, 0)),
            GridAction::MoveDown => Some((1, 0)),
            GridAction::MoveLeft => Some((0, -1)),
            GridAction::MoveRight => Some((0, 1)),
            GridAction::ClearSelection | GridAction::StartEdit => None,
        }
    }
}

/// A key, named the way DOM `KeyboardEvent.key` names it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    /// A printable single character
    Char(char),
    /// Any other named key ("Shift", "Control", "F2", ...)
    Named(String),
}

impl Key {
    pub fn from_dom(name: &str) -> Self {
        match name {
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Named(name.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::ArrowUp => f.write_str("ArrowUp"),
            Key::ArrowDown => f.write_str("ArrowDown"),
            Key::ArrowLeft => f.write_str("ArrowLeft"),
            Key::ArrowRight => f.write_str("ArrowRight"),
            Key::Enter => f.write_str("Enter"),
            Key::Tab => f.write_str("Tab"),
            Key::Escape => f.write_str("Escape"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Delete => f.write_str("Delete"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Named(name) => f.write_str(name),
        }
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from_dom(&name)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Where a key event was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Anywhere in the document outside the cell editor
    Document,
    /// The in-cell text input owns the event
    Editor,
}

/// One or more keys that must be held together to trigger `action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub keys: Vec<Key>,
    pub action: GridAction,
}

impl KeyBinding {
    pub fn new(keys: Vec<Key>, action: GridAction) -> Self {
        Self { keys, action }
    }

    pub fn single(key: Key, action: GridAction) -> Self {
        Self::new(vec![key], action)
    }
}

/// The grid's stock bindings: delete keys clear, Enter edits, arrows move
pub fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::single(Key::Delete, GridAction::ClearSelection),
        KeyBinding::single(Key::Backspace, GridAction::ClearSelection),
        KeyBinding::single(Key::Enter, GridAction::StartEdit),
        KeyBinding::single(Key::ArrowUp, GridAction::MoveUp),
        KeyBinding::single(Key::ArrowDown, GridAction::MoveDown),
        KeyBinding::single(Key::ArrowLeft, GridAction::MoveLeft),
        KeyBinding::single(Key::ArrowRight, GridAction::MoveRight),
    ]
}

#[derive(Debug, Clone)]
struct ChordTracker {
    binding: KeyBinding,
    held: Vec<Key>,
}

impl ChordTracker {
    fn watches(&self, key: &Key) -> bool {
        self.binding.keys.contains(key)
    }

    fn press(&mut self, key: &Key) -> bool {
        if !self.watches(key) {
            return false;
        }
        if !self.held.contains(key) {
            self.held.push(key.clone());
        }
        true
    }

    fn release(&mut self, key: &Key) -> Option<GridAction> {
        if !self.watches(key) {
            return None;
        }
        let complete = self.binding.keys.iter().all(|k| self.held.contains(k));
        self.held.retain(|k| k != key);
        complete.then_some(self.binding.action)
    }
}

/// Tracks held keys per binding and reports which bindings fire on release.
///
/// Each binding only watches its own keys. A binding fires on the keyup of
/// any of its keys when all of them are held at that moment.
#[derive(Debug, Clone)]
pub struct KeyboardController {
    trackers: Vec<ChordTracker>,
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::new(default_bindings())
    }
}

impl KeyboardController {
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self {
            trackers: bindings
                .into_iter()
                .map(|binding| ChordTracker {
                    binding,
                    held: Vec::new(),
                })
                .collect(),
        }
    }

    /// Record a keydown. Returns true if any binding watches the key.
    pub fn key_down(&mut self, key: &Key) -> bool {
        self.trackers
            .iter_mut()
            .fold(false, |watched, tracker| tracker.press(key) | watched)
    }

    /// Record a keyup and return the actions whose chords completed, in binding order
    pub fn key_up(&mut self, key: &Key) -> Vec<GridAction> {
        self.trackers
            .iter_mut()
            .filter_map(|tracker| tracker.release(key))
            .collect()
    }

    /// Forget all held keys (focus loss, unmount)
    pub fn reset(&mut self) {
        for tracker in &mut self.trackers {
            tracker.held.clear();
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.trackers.iter().map(|tracker| &tracker.binding)
    }
}
