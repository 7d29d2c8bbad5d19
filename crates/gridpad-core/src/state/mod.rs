pub mod edit;
pub mod input;
pub mod selection;
pub mod viewport;

pub use edit::EditSession;
pub use input::{default_bindings, GridAction, Key, KeyBinding, KeyOrigin, KeyboardController};
pub use selection::Selection;
pub use viewport::{ViewportState, VisibleRange};

use serde::{Deserialize, Serialize};

use crate::clipboard::{self, ClipboardBackend};
use crate::config::{EditSwitch, GridConfig};
use crate::error::Result;
use crate::position::{CellPosition, CellRange};
use crate::store::CellStore;

/// What the renderer needs to draw one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    /// Inside the selected rectangle
    pub selected: bool,
    /// The cell the selection started from
    pub anchor: bool,
    /// The cell editor is open here
    pub editing: bool,
    /// Draft while editing, stored value otherwise
    pub text: String,
}

/// Complete grid state: cells, selection, editor and key tracking.
///
/// Every input handler runs to completion and leaves the state consistent,
/// matching the one-event-at-a-time model of a UI thread.
#[derive(Debug, Clone)]
pub struct GridState {
    pub store: CellStore,
    pub selection: Selection,
    pub edit: EditSession,
    pub viewport: ViewportState,
    keys: KeyboardController,
    config: GridConfig,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

impl GridState {
    pub fn new() -> Self {
        Self::from_valid_config(GridConfig::default())
    }

    pub fn with_config(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GridConfig) -> Self {
        Self {
            store: CellStore::new(),
            selection: Selection::new(),
            edit: EditSession::new(),
            viewport: ViewportState::new(),
            keys: KeyboardController::new(config.bindings.clone()),
            config,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    pub fn anchor(&self) -> CellPosition {
        self.selection.anchor()
    }

    // Mouse

    pub fn mouse_down(&mut self, pos: CellPosition, shift: bool) {
        let pos = self.config.clamp(pos);
        self.selection.begin(pos, shift);
    }

    /// Returns true if the selection changed
    pub fn mouse_over(&mut self, pos: CellPosition) -> bool {
        let pos = self.config.clamp(pos);
        if self.selection.range().end == pos {
            return false;
        }
        self.selection.extend_to(pos)
    }

    pub fn mouse_up(&mut self) {
        self.selection.end_drag();
    }

    pub fn double_click(&mut self, pos: CellPosition) {
        self.start_edit_at(pos);
    }

    // Editing

    /// Open the editor on `pos` seeded with its stored value.
    ///
    /// A session already open on another cell is closed according to
    /// [`GridConfig::edit_switch`].
    pub fn start_edit_at(&mut self, pos: CellPosition) {
        let pos = self.config.clamp(pos);
        if self.edit.is_editing_at(pos) {
            return;
        }
        let initial = self.store.display(pos.row, pos.col).to_string();
        if let Some((previous, draft)) = self.edit.start(pos, initial) {
            match self.config.edit_switch {
                EditSwitch::Discard => {
                    tracing::debug!(%previous, "discarding unconfirmed draft");
                }
                EditSwitch::Commit => {
                    edit::write_draft(&mut self.store, previous, draft);
                }
            }
        }
        tracing::debug!(%pos, "editing cell");
    }

    pub fn editor_input(&mut self, value: impl Into<String>) -> Result<()> {
        self.edit.update_draft(value)
    }

    /// Confirm the open edit (blur or Enter in the editor)
    pub fn commit_edit(&mut self) -> Option<CellPosition> {
        let written = self.edit.commit(&mut self.store);
        if let Some(pos) = written {
            tracing::debug!(%pos, "committed cell edit");
        }
        written
    }

    pub fn cancel_edit(&mut self) -> Option<String> {
        self.edit.cancel()
    }

    // Keyboard

    /// Feed a keydown. Returns true when the grid owns the key and the
    /// caller should suppress the default browser behavior.
    pub fn key_down(&mut self, key: &Key, origin: KeyOrigin) -> bool {
        match origin {
            KeyOrigin::Editor => false,
            KeyOrigin::Document => self.keys.key_down(key) && !self.is_editing(),
        }
    }

    /// Feed a keyup. Returns true if grid state changed.
    pub fn key_up(&mut self, key: &Key, origin: KeyOrigin) -> bool {
        match origin {
            KeyOrigin::Editor => match key {
                Key::Enter => {
                    self.commit_edit();
                    true
                }
                Key::Escape => self.cancel_edit().is_some(),
                _ => false,
            },
            KeyOrigin::Document => {
                let actions = self.keys.key_up(key);
                actions
                    .into_iter()
                    .fold(false, |changed, action| self.apply(action) | changed)
            }
        }
    }

    /// Forget held keys, e.g. when the window loses focus
    pub fn reset_keys(&mut self) {
        self.keys.reset();
    }

    /// Run a grid action. Every action is vetoed while the editor is open so
    /// that typing in the editor never reaches the grid.
    pub fn apply(&mut self, action: GridAction) -> bool {
        if self.is_editing() {
            tracing::trace!(?action, "ignored while editing");
            return false;
        }
        match action {
            GridAction::MoveUp
            | GridAction::MoveDown
            | GridAction::MoveLeft
            | GridAction::MoveRight => {
                let Some((delta_row, delta_col)) = action.move_delta() else {
                    return false;
                };
                let target = self.selection.move_anchor_by(
                    delta_row,
                    delta_col,
                    self.config.max_row(),
                    self.config.max_col(),
                );
                self.viewport.ensure_cell_visible(target);
                tracing::trace!(%target, "moved selection");
                true
            }
            GridAction::ClearSelection => {
                let cleared = self.store.clear_range(self.selection.range());
                tracing::debug!(cleared, "cleared selection");
                cleared > 0
            }
            GridAction::StartEdit => {
                self.start_edit_at(self.anchor());
                true
            }
        }
    }

    // Clipboard

    /// Write the selection to the clipboard as tab-separated text
    pub fn copy(&self, clipboard: &mut impl ClipboardBackend) -> Result<String> {
        let range = self.selection.range();
        let text = clipboard::serialize_range(&self.store, range);
        clipboard.write_text(&text)?;
        tracing::debug!(cells = range.cell_count(), "copied selection");
        Ok(text)
    }

    /// Read clipboard text into the grid starting at the anchor cell.
    /// The store is untouched when the clipboard cannot be read.
    pub fn paste(&mut self, clipboard: &mut impl ClipboardBackend) -> Result<CellRange> {
        let text = clipboard.read_text()?;
        Ok(self.paste_text(&text))
    }

    pub fn paste_text(&mut self, text: &str) -> CellRange {
        let origin = self.anchor();
        let last = self.config.last_cell();
        let written = clipboard::deserialize_into(&mut self.store, text, origin, last);
        tracing::debug!(cells = written.cell_count(), "pasted into grid");
        written
    }

    // Rendering

    pub fn cell_view(&self, pos: CellPosition) -> CellView {
        let editing = self.edit.is_editing_at(pos);
        let text = match self.edit.draft() {
            Some(draft) if editing => draft.to_string(),
            _ => self.store.display(pos.row, pos.col).to_string(),
        };
        CellView {
            row: pos.row,
            col: pos.col,
            selected: self.selection.is_selected(pos),
            anchor: self.selection.is_anchor(pos),
            editing,
            text,
        }
    }

    /// Views for every cell of `range` in row-major order
    pub fn cell_views(&self, range: CellRange) -> Vec<CellView> {
        range.positions().map(|pos| self.cell_view(pos)).collect()
    }

    /// Part of a requested window that lies inside the grid
    pub fn clip_window(
        &self,
        first_row: usize,
        first_col: usize,
        rows: usize,
        cols: usize,
    ) -> Option<VisibleRange> {
        VisibleRange::clipped(first_row, first_col, rows, cols, self.config.last_cell())
    }

    /// Record the window the renderer has on screen. Windows entirely
    /// outside the grid are ignored.
    pub fn set_visible(&mut self, first_row: usize, first_col: usize, rows: usize, cols: usize) {
        match self.clip_window(first_row, first_col, rows, cols) {
            Some(range) => self.viewport.set_visible(range),
            None => tracing::trace!(first_row, first_col, rows, cols, "ignored empty window"),
        }
    }

    pub fn take_scroll_target(&mut self) -> Option<CellPosition> {
        self.viewport.take_scroll_target()
    }

    // Persistence

    pub fn export_cells(&self) -> Result<String> {
        self.store.to_json()
    }

    /// Replace all cells from a snapshot. Any open edit is cancelled.
    pub fn import_cells(&mut self, json: &str) -> Result<()> {
        let store = CellStore::from_json(json)?;
        self.edit.cancel();
        self.store = store;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::error::{ClipboardError, GridError};

    fn pos(row: usize, col: usize) -> CellPosition {
        CellPosition::new(row, col)
    }

    fn press(state: &mut GridState, key: Key) -> bool {
        state.key_down(&key, KeyOrigin::Document);
        state.key_up(&key, KeyOrigin::Document)
    }

    fn type_into(state: &mut GridState, at: CellPosition, text: &str) {
        state.double_click(at);
        state.editor_input(text).unwrap();
        state.commit_edit();
    }

    struct DeniedClipboard;

    impl ClipboardBackend for DeniedClipboard {
        fn read_text(&mut self) -> std::result::Result<String, ClipboardError> {
            Err(ClipboardError::PermissionDenied("blocked".to_string()))
        }

        fn write_text(&mut self, _text: &str) -> std::result::Result<(), ClipboardError> {
            Err(ClipboardError::PermissionDenied("blocked".to_string()))
        }
    }

    #[test]
    fn test_new_state() {
        let state = GridState::new();
        assert_eq!(state.anchor(), CellPosition::origin());
        assert!(!state.is_editing());
        assert!(state.store.is_empty());
        assert_eq!(state.config(), &GridConfig::default());
    }

    #[test]
    fn test_with_invalid_config() {
        let err = GridState::with_config(GridConfig::with_extent(0, 10)).unwrap_err();
        assert!(matches!(err, GridError::InvalidConfig(_)));
    }

    #[test]
    fn test_mouse_drag_selection() {
        let mut state = GridState::new();
        state.mouse_down(pos(4, 4), false);
        assert!(state.mouse_over(pos(2, 6)));
        assert!(!state.mouse_over(pos(2, 6)));
        state.mouse_up();
        assert!(!state.mouse_over(pos(9, 9)));

        assert_eq!(state.anchor(), pos(4, 4));
        assert!(state.cell_view(pos(3, 5)).selected);
        assert!(!state.cell_view(pos(5, 5)).selected);
    }

    #[test]
    fn test_shift_click_extends() {
        let mut state = GridState::new();
        state.mouse_down(pos(1, 1), false);
        state.mouse_up();
        state.mouse_down(pos(3, 3), true);
        state.mouse_up();
        assert_eq!(state.anchor(), pos(1, 1));
        assert_eq!(state.selection.range().cell_count(), 9);
    }

    #[test]
    fn test_arrow_right_from_origin() {
        let mut state = GridState::new();
        assert!(press(&mut state, Key::ArrowRight));
        assert_eq!(state.selection.range(), CellRange::single_cell(pos(0, 1)));
    }

    #[test]
    fn test_arrows_collapse_multi_cell_selection() {
        let mut state = GridState::new();
        state.mouse_down(pos(2, 2), false);
        state.mouse_over(pos(5, 5));
        state.mouse_up();

        press(&mut state, Key::ArrowDown);
        assert_eq!(state.selection.range(), CellRange::single_cell(pos(3, 2)));
        press(&mut state, Key::ArrowLeft);
        press(&mut state, Key::ArrowUp);
        assert_eq!(state.selection.range(), CellRange::single_cell(pos(2, 1)));
    }

    #[test]
    fn test_arrows_clamp_to_extent() {
        let mut state = GridState::with_config(GridConfig::with_extent(3, 3)).unwrap();
        press(&mut state, Key::ArrowUp);
        press(&mut state, Key::ArrowLeft);
        assert_eq!(state.anchor(), pos(0, 0));
        for _ in 0..5 {
            press(&mut state, Key::ArrowDown);
            press(&mut state, Key::ArrowRight);
        }
        assert_eq!(state.anchor(), pos(2, 2));
    }

    #[test]
    fn test_mouse_positions_clamp_to_extent() {
        let mut state = GridState::with_config(GridConfig::with_extent(3, 3)).unwrap();
        state.mouse_down(pos(usize::MAX, 1), false);
        assert_eq!(state.anchor(), pos(2, 1));

        assert!(state.mouse_over(pos(0, 50)));
        assert_eq!(state.selection.range(), CellRange::new(pos(2, 1), pos(0, 2)));
        state.mouse_up();

        state.double_click(pos(7, 7));
        assert_eq!(state.edit.position(), Some(pos(2, 2)));
    }

    #[test]
    fn test_offgrid_window_is_ignored() {
        let mut state = GridState::with_config(GridConfig::with_extent(3, 3)).unwrap();
        state.set_visible(0, 0, 100, 100);
        assert_eq!(state.viewport.visible_range(), Some(VisibleRange::new(0, 2, 0, 2)));

        state.set_visible(usize::MAX, 0, 2, 1);
        assert_eq!(state.viewport.visible_range(), Some(VisibleRange::new(0, 2, 0, 2)));
        assert_eq!(state.clip_window(3, 0, 1, 1), None);
    }

    #[test]
    fn test_navigation_requests_scroll() {
        let mut state = GridState::new();
        state.set_visible(0, 0, 2, 2);
        press(&mut state, Key::ArrowDown);
        assert_eq!(state.take_scroll_target(), None);
        press(&mut state, Key::ArrowDown);
        assert_eq!(state.take_scroll_target(), Some(pos(2, 0)));
    }

    #[test]
    fn test_enter_starts_edit_at_anchor_with_value() {
        let mut state = GridState::new();
        state.store.set(1, 2, "stored");
        state.mouse_down(pos(1, 2), false);
        state.mouse_up();

        assert!(press(&mut state, Key::Enter));

        assert!(state.edit.is_editing_at(pos(1, 2)));
        assert_eq!(state.edit.draft(), Some("stored"));
        let view = state.cell_view(pos(1, 2));
        assert!(view.editing);
        assert_eq!(view.text, "stored");
    }

    #[test]
    fn test_enter_in_editor_commits_without_reopening() {
        let mut state = GridState::new();
        press(&mut state, Key::Enter);
        state.editor_input("hi").unwrap();

        // Enter inside the editor belongs to the editor
        assert!(!state.key_down(&Key::Enter, KeyOrigin::Editor));
        assert!(state.key_up(&Key::Enter, KeyOrigin::Editor));

        assert!(!state.is_editing());
        assert_eq!(state.store.get(0, 0), Some("hi"));
    }

    #[test]
    fn test_escape_in_editor_cancels() {
        let mut state = GridState::new();
        state.store.set(0, 0, "keep");
        state.double_click(pos(0, 0));
        state.editor_input("changed").unwrap();

        assert!(state.key_up(&Key::Escape, KeyOrigin::Editor));
        assert!(!state.is_editing());
        assert_eq!(state.store.get(0, 0), Some("keep"));
    }

    #[test]
    fn test_global_keys_vetoed_while_editing() {
        let mut state = GridState::new();
        state.store.set(0, 0, "a");
        state.store.set(0, 1, "b");
        state.mouse_down(pos(0, 0), false);
        state.mouse_over(pos(0, 1));
        state.mouse_up();
        state.double_click(pos(5, 5));
        let selection_before = state.selection.clone();
        let store_before = state.store.clone();

        for key in [
            Key::Delete,
            Key::Backspace,
            Key::Enter,
            Key::ArrowUp,
            Key::ArrowDown,
            Key::ArrowLeft,
            Key::ArrowRight,
        ] {
            assert!(!state.key_down(&key, KeyOrigin::Document));
            assert!(!state.key_up(&key, KeyOrigin::Document));
        }

        assert_eq!(state.selection, selection_before);
        assert_eq!(state.store, store_before);
        assert!(state.edit.is_editing_at(pos(5, 5)));
    }

    #[test]
    fn test_key_down_reports_ownership() {
        let mut state = GridState::new();
        assert!(state.key_down(&Key::ArrowDown, KeyOrigin::Document));
        assert!(!state.key_down(&Key::Char('x'), KeyOrigin::Document));
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut state = GridState::new();
        state.store.set(0, 0, "a");
        state.store.set(1, 1, "d");
        state.store.set(3, 3, "far");
        state.mouse_down(pos(1, 1), false);
        state.mouse_over(pos(0, 0));
        state.mouse_up();

        assert!(press(&mut state, Key::Backspace));

        assert_eq!(state.store.get(0, 0), None);
        assert_eq!(state.store.get(1, 1), None);
        assert_eq!(state.store.get(3, 3), Some("far"));
        assert!(!press(&mut state, Key::Delete));
    }

    #[test]
    fn test_switching_edit_discards_draft() {
        let mut state = GridState::new();
        state.store.set(0, 0, "before");
        state.double_click(pos(0, 0));
        state.editor_input("draft for a").unwrap();

        state.double_click(pos(1, 1));

        assert_eq!(state.store.get(0, 0), Some("before"));
        assert!(state.edit.is_editing_at(pos(1, 1)));
    }

    #[test]
    fn test_switching_edit_can_commit() {
        let config = GridConfig {
            edit_switch: EditSwitch::Commit,
            ..GridConfig::default()
        };
        let mut state = GridState::with_config(config).unwrap();
        state.double_click(pos(0, 0));
        state.editor_input("kept").unwrap();

        state.double_click(pos(1, 1));

        assert_eq!(state.store.get(0, 0), Some("kept"));
    }

    #[test]
    fn test_double_click_on_editing_cell_keeps_draft() {
        let mut state = GridState::new();
        state.double_click(pos(2, 2));
        state.editor_input("typing").unwrap();
        state.double_click(pos(2, 2));
        assert_eq!(state.edit.draft(), Some("typing"));
    }

    #[test]
    fn test_blur_commit_rules() {
        let mut state = GridState::new();
        state.double_click(pos(7, 7));
        assert_eq!(state.commit_edit(), None);
        assert!(!state.store.has_record(7, 7));

        type_into(&mut state, pos(7, 7), "x");
        type_into(&mut state, pos(7, 7), "");
        assert_eq!(state.store.get(7, 7), Some(""));
    }

    #[test]
    fn test_editor_input_without_session() {
        let mut state = GridState::new();
        assert!(matches!(state.editor_input("x"), Err(GridError::NotEditing)));
    }

    #[test]
    fn test_copy_selection() {
        let mut state = GridState::new();
        type_into(&mut state, pos(0, 0), "a");
        type_into(&mut state, pos(0, 1), "b");
        type_into(&mut state, pos(1, 0), "c");
        type_into(&mut state, pos(1, 1), "d");
        state.mouse_down(pos(0, 0), false);
        state.mouse_over(pos(1, 1));
        state.mouse_up();

        let mut clipboard = MemoryClipboard::new();
        let text = state.copy(&mut clipboard).unwrap();

        assert_eq!(text, "a\tb\nc\td");
        assert_eq!(clipboard.text(), Some("a\tb\nc\td"));
    }

    #[test]
    fn test_paste_at_anchor() {
        let mut state = GridState::new();
        state.mouse_down(pos(2, 3), false);
        state.mouse_up();

        let mut clipboard = MemoryClipboard::with_text("x\ty\nz\tw");
        let written = state.paste(&mut clipboard).unwrap();

        assert_eq!(written, CellRange::new(pos(2, 3), pos(3, 4)));
        assert_eq!(state.store.get(2, 3), Some("x"));
        assert_eq!(state.store.get(2, 4), Some("y"));
        assert_eq!(state.store.get(3, 3), Some("z"));
        assert_eq!(state.store.get(3, 4), Some("w"));
    }

    #[test]
    fn test_paste_at_bottom_right_cell_stays_in_grid() {
        let mut state = GridState::with_config(GridConfig::with_extent(3, 3)).unwrap();
        state.mouse_down(pos(2, 2), false);
        state.mouse_up();

        let written = state.paste_text("a\tb\nc\td");

        assert_eq!(written, CellRange::single_cell(pos(2, 2)));
        assert_eq!(state.store.get(2, 2), Some("a"));
        assert_eq!(state.store.get(3, 3), None);
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_copy_then_paste_elsewhere() {
        let mut state = GridState::new();
        state.store.set(0, 0, "1");
        state.store.set(1, 1, "2");
        state.mouse_down(pos(0, 0), false);
        state.mouse_over(pos(1, 1));
        state.mouse_up();
        let mut clipboard = MemoryClipboard::new();
        state.copy(&mut clipboard).unwrap();

        state.mouse_down(pos(10, 10), false);
        state.mouse_up();
        state.paste(&mut clipboard).unwrap();

        assert_eq!(state.store.get(10, 10), Some("1"));
        assert_eq!(state.store.get(10, 11), Some(""));
        assert_eq!(state.store.get(11, 10), Some(""));
        assert_eq!(state.store.get(11, 11), Some("2"));
    }

    #[test]
    fn test_clipboard_failure_leaves_state_unchanged() {
        let mut state = GridState::new();
        state.store.set(0, 0, "safe");
        let before = state.store.clone();

        let err = state.paste(&mut DeniedClipboard).unwrap_err();
        assert_eq!(err.code(), "CLIPBOARD_DENIED");
        assert!(state.copy(&mut DeniedClipboard).is_err());
        assert_eq!(state.store, before);
    }

    #[test]
    fn test_cell_views_window() {
        let mut state = GridState::new();
        state.store.set(0, 1, "v");
        state.mouse_down(pos(0, 0), false);
        state.mouse_over(pos(0, 1));
        state.mouse_up();

        let views = state.cell_views(CellRange::new(pos(0, 0), pos(1, 1)));

        assert_eq!(views.len(), 4);
        assert!(views[0].anchor && views[0].selected);
        assert!(!views[1].anchor && views[1].selected);
        assert_eq!(views[1].text, "v");
        assert!(!views[2].selected);
        assert_eq!((views[3].row, views[3].col), (1, 1));
    }

    #[test]
    fn test_cell_view_serializes_camel_case() {
        let state = GridState::new();
        let json = serde_json::to_value(state.cell_view(pos(0, 0))).unwrap();
        assert_eq!(json["anchor"], true);
        assert_eq!(json["text"], "");
    }

    #[test]
    fn test_export_import_cells() {
        let mut state = GridState::new();
        state.store.set(3, 4, "saved");
        let json = state.export_cells().unwrap();

        let mut other = GridState::new();
        other.double_click(pos(0, 0));
        other.import_cells(&json).unwrap();

        assert!(!other.is_editing());
        assert_eq!(other.store.get(3, 4), Some("saved"));
        assert!(other.import_cells("[1, 2]").is_err());
        assert_eq!(other.store.get(3, 4), Some("saved"));
    }
}
