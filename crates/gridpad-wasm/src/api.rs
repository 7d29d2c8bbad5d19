use std::cell::RefCell;
use std::rc::Rc;

use gridpad_core::{CellPosition, CellRange, GridConfig, GridError, GridState, Key, KeyOrigin};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::listeners::GridListeners;
use crate::viewport::ViewportBuffer;

/// Grid engine exposed to the JavaScript renderer
#[wasm_bindgen]
pub struct GridEngine {
    state: Rc<RefCell<GridState>>,
    notifier: ChangeNotifier,
    /// Reusable buffer for viewport data (zero-copy optimization)
    viewport_buffer: ViewportBuffer,
}

/// Structured error object for JavaScript
#[derive(Serialize)]
pub struct JsGridError {
    code: String,
    message: String,
}

impl From<GridError> for JsGridError {
    fn from(err: GridError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn to_js_error(err: GridError) -> JsValue {
    let js_error = JsGridError::from(err);
    serde_wasm_bindgen::to_value(&js_error).unwrap_or(JsValue::NULL)
}

/// Calls the renderer back after document-level events changed the grid
#[derive(Clone, Default)]
pub(crate) struct ChangeNotifier(Rc<RefCell<Option<js_sys::Function>>>);

impl ChangeNotifier {
    fn set(&self, callback: Option<js_sys::Function>) {
        *self.0.borrow_mut() = callback;
    }

    pub(crate) fn notify(&self) {
        // Released before the call; the callback may replace itself
        let callback = self.0.borrow().clone();
        if let Some(callback) = callback {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                web_sys::console::error_1(&err);
            }
        }
    }
}

fn pos(row: u32, col: u32) -> CellPosition {
    CellPosition::new(row as usize, col as usize)
}

/// Requested window cut to the grid; `None` if nothing of it is inside
fn window(
    state: &GridState,
    first_row: u32,
    first_col: u32,
    rows: u32,
    cols: u32,
) -> Option<CellRange> {
    state
        .clip_window(first_row as usize, first_col as usize, rows as usize, cols as usize)
        .map(|visible| visible.as_range())
}

impl GridEngine {
    fn from_state(state: GridState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            notifier: ChangeNotifier::default(),
            viewport_buffer: ViewportBuffer::with_capacity(1000),
        }
    }

    fn from_config_json(json: &str) -> Result<Self, GridError> {
        let config = GridConfig::from_json(json)?;
        Ok(Self::from_state(GridState::with_config(config)?))
    }
}

#[wasm_bindgen]
impl GridEngine {
    /// Create a grid with the default configuration
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from_state(GridState::new())
    }

    /// Create a grid from a JSON configuration (missing fields use defaults)
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<GridEngine, JsValue> {
        Self::from_config_json(json).map_err(to_js_error)
    }

    /// Create a grid from a plain options object, e.g. `{ rowCount: 500 }`
    #[wasm_bindgen(js_name = fromOptions)]
    pub fn from_options(options: JsValue) -> Result<GridEngine, JsValue> {
        let config: GridConfig = serde_wasm_bindgen::from_value(options)?;
        GridState::with_config(config)
            .map(Self::from_state)
            .map_err(to_js_error)
    }

    /// Attach document listeners for copy/paste/keys. Keep the returned
    /// handle while the grid is mounted and call `unmount()` when it goes away.
    pub fn mount(&self) -> Result<GridListeners, JsValue> {
        GridListeners::attach(self.state.clone(), self.notifier.clone())
    }

    /// Register a callback fired after document-level events change the grid
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: Option<js_sys::Function>) {
        self.notifier.set(callback);
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    #[wasm_bindgen(js_name = rowCount)]
    pub fn row_count(&self) -> u32 {
        self.state.borrow().config().row_count as u32
    }

    #[wasm_bindgen(js_name = columnCount)]
    pub fn column_count(&self) -> u32 {
        self.state.borrow().config().column_count as u32
    }

    #[wasm_bindgen(js_name = rowHeight)]
    pub fn row_height(&self, index: u32) -> f64 {
        self.state.borrow().config().row_height.size(index as usize)
    }

    #[wasm_bindgen(js_name = columnWidth)]
    pub fn column_width(&self, index: u32) -> f64 {
        self.state.borrow().config().column_width.size(index as usize)
    }

    #[wasm_bindgen(js_name = rowOffset)]
    pub fn row_offset(&self, index: u32) -> f64 {
        self.state.borrow().config().row_height.offset(index as usize)
    }

    #[wasm_bindgen(js_name = columnOffset)]
    pub fn column_offset(&self, index: u32) -> f64 {
        self.state.borrow().config().column_width.offset(index as usize)
    }

    /// Get cell coordinates from pixel coordinates
    #[wasm_bindgen(js_name = getCellFromPixel)]
    pub fn get_cell_from_pixel(&self, x: f64, y: f64) -> Vec<u32> {
        let state = self.state.borrow();
        let config = state.config();
        let row = config.row_height.index_at(y).min(config.max_row());
        let col = config.column_width.index_at(x).min(config.max_col());
        vec![row as u32, col as u32]
    }

    // =========================================================================
    // Cell handlers
    // =========================================================================

    #[wasm_bindgen(js_name = onMouseDown)]
    pub fn on_mouse_down(&self, row: u32, col: u32, shift: bool) {
        self.state.borrow_mut().mouse_down(pos(row, col), shift);
    }

    /// Returns true if the selection changed
    #[wasm_bindgen(js_name = onMouseOver)]
    pub fn on_mouse_over(&self, row: u32, col: u32) -> bool {
        self.state.borrow_mut().mouse_over(pos(row, col))
    }

    #[wasm_bindgen(js_name = onMouseUp)]
    pub fn on_mouse_up(&self) {
        self.state.borrow_mut().mouse_up();
    }

    #[wasm_bindgen(js_name = onDoubleClick)]
    pub fn on_double_click(&self, row: u32, col: u32) {
        self.state.borrow_mut().double_click(pos(row, col));
    }

    #[wasm_bindgen(js_name = onEditorInput)]
    pub fn on_editor_input(&self, value: String) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .editor_input(value)
            .map_err(to_js_error)
    }

    /// Confirm the edit. Returns true if a value was written.
    #[wasm_bindgen(js_name = onEditorBlur)]
    pub fn on_editor_blur(&self) -> bool {
        self.state.borrow_mut().commit_edit().is_some()
    }

    /// Keyup inside the cell editor (Enter confirms, Escape cancels)
    #[wasm_bindgen(js_name = onEditorKeyUp)]
    pub fn on_editor_key_up(&self, key: &str) -> bool {
        self.state
            .borrow_mut()
            .key_up(&Key::from_dom(key), KeyOrigin::Editor)
    }

    #[wasm_bindgen(js_name = isEditing)]
    pub fn is_editing(&self) -> bool {
        self.state.borrow().is_editing()
    }

    #[wasm_bindgen(js_name = getCellValue)]
    pub fn get_cell_value(&self, row: u32, col: u32) -> Option<String> {
        self.state
            .borrow()
            .store
            .get(row as usize, col as usize)
            .map(str::to_string)
    }

    /// Get one cell's render view as JSON
    #[wasm_bindgen(js_name = getCellView)]
    pub fn get_cell_view(&self, row: u32, col: u32) -> String {
        let view = self.state.borrow().cell_view(pos(row, col));
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get render views for a window of cells as a JSON array (row-major)
    #[wasm_bindgen(js_name = getCellViews)]
    pub fn get_cell_views(&self, first_row: u32, first_col: u32, rows: u32, cols: u32) -> String {
        let state = self.state.borrow();
        let Some(range) = window(&state, first_row, first_col, rows, cols) else {
            return "[]".to_string();
        };
        let views = state.cell_views(range);
        serde_json::to_string(&views).unwrap_or_else(|_| "[]".to_string())
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    /// Report the window the renderer has on screen
    #[wasm_bindgen(js_name = setVisibleRange)]
    pub fn set_visible_range(&self, first_row: u32, first_col: u32, rows: u32, cols: u32) {
        self.state.borrow_mut().set_visible(
            first_row as usize,
            first_col as usize,
            rows as usize,
            cols as usize,
        );
    }

    /// `[row, col]` the renderer should scroll into view, if any
    #[wasm_bindgen(js_name = takeScrollTarget)]
    pub fn take_scroll_target(&self) -> Option<Vec<u32>> {
        self.state
            .borrow_mut()
            .take_scroll_target()
            .map(|target| vec![target.row as u32, target.col as u32])
    }

    /// Populate the internal viewport buffer with the given window.
    /// Call this before reading the viewport arrays.
    #[wasm_bindgen(js_name = populateViewport)]
    pub fn populate_viewport(&mut self, first_row: u32, first_col: u32, rows: u32, cols: u32) {
        self.viewport_buffer.clear();
        let state = self.state.borrow();
        let Some(range) = window(&state, first_row, first_col, rows, cols) else {
            return;
        };
        for position in range.positions() {
            self.viewport_buffer.push_view(state.cell_view(position));
        }
    }

    /// Get the number of cells in the viewport buffer
    #[wasm_bindgen(js_name = getViewportLen)]
    pub fn get_viewport_len(&self) -> usize {
        self.viewport_buffer.len()
    }

    /// Get pointer to viewport row indices (Uint32Array)
    #[wasm_bindgen(js_name = getViewportRowsPtr)]
    pub fn get_viewport_rows_ptr(&self) -> *const u32 {
        self.viewport_buffer.rows.as_ptr()
    }

    /// Get pointer to viewport column indices (Uint32Array)
    #[wasm_bindgen(js_name = getViewportColsPtr)]
    pub fn get_viewport_cols_ptr(&self) -> *const u32 {
        self.viewport_buffer.cols.as_ptr()
    }

    /// Get pointer to viewport state flags (Uint32Array)
    #[wasm_bindgen(js_name = getViewportFlagsPtr)]
    pub fn get_viewport_flags_ptr(&self) -> *const u32 {
        self.viewport_buffer.flags.as_ptr()
    }

    /// Get viewport texts as JSON (strings still need serialization)
    #[wasm_bindgen(js_name = getViewportTexts)]
    pub fn get_viewport_texts(&self) -> String {
        serde_json::to_string(&self.viewport_buffer.texts).unwrap_or_else(|_| "[]".to_string())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Export all cells as JSON keyed by "row,col"
    #[wasm_bindgen(js_name = exportCells)]
    pub fn export_cells(&self) -> Result<String, JsValue> {
        self.state.borrow().export_cells().map_err(to_js_error)
    }

    /// Replace all cells from an `exportCells` snapshot
    #[wasm_bindgen(js_name = importCells)]
    pub fn import_cells(&self, json: &str) -> Result<(), JsValue> {
        self.state.borrow_mut().import_cells(json).map_err(to_js_error)
    }
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpad_core::CellView;

    fn views(engine: &GridEngine, first_row: u32, first_col: u32, rows: u32, cols: u32) -> Vec<CellView> {
        serde_json::from_str(&engine.get_cell_views(first_row, first_col, rows, cols)).unwrap()
    }

    #[test]
    fn test_default_dimensions() {
        let engine = GridEngine::new();
        assert_eq!(engine.row_count(), 1_000_000);
        assert_eq!(engine.column_count(), 1_000);
        assert_eq!(engine.row_height(0), 30.0);
        assert_eq!(engine.row_height(1), 40.0);
        assert_eq!(engine.column_width(1), 100.0);
        assert_eq!(engine.row_offset(2), 70.0);
        assert_eq!(engine.column_offset(2), 180.0);
    }

    #[test]
    fn test_cell_from_pixel() {
        let engine = GridEngine::from_config_json(r#"{"rowCount": 3, "columnCount": 3}"#)
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(engine.get_cell_from_pixel(85.0, 35.0), vec![1, 1]);
        assert_eq!(engine.get_cell_from_pixel(10_000.0, 10_000.0), vec![2, 2]);
    }

    #[test]
    fn test_from_config_json_rejects_invalid() {
        let err = GridEngine::from_config_json(r#"{"rowCount": 0}"#).err().unwrap();
        assert_eq!(JsGridError::from(err).code, "INVALID_CONFIG");
    }

    #[test]
    fn test_drag_then_views() {
        let engine = GridEngine::new();
        engine.on_mouse_down(1, 1, false);
        assert!(engine.on_mouse_over(2, 2));
        engine.on_mouse_up();

        let views = views(&engine, 0, 0, 3, 3);
        assert_eq!(views.len(), 9);
        let selected: Vec<_> = views.iter().filter(|v| v.selected).map(|v| (v.row, v.col)).collect();
        assert_eq!(selected, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
        assert!(views[4].anchor);
    }

    #[test]
    fn test_edit_flow() {
        let engine = GridEngine::new();
        engine.on_double_click(0, 0);
        assert!(engine.is_editing());
        engine.on_editor_input("hello".to_string()).unwrap();

        let view: CellView = serde_json::from_str(&engine.get_cell_view(0, 0)).unwrap();
        assert!(view.editing);
        assert_eq!(view.text, "hello");
        assert_eq!(engine.get_cell_value(0, 0), None);

        assert!(engine.on_editor_key_up("Enter"));
        assert!(!engine.is_editing());
        assert_eq!(engine.get_cell_value(0, 0), Some("hello".to_string()));
    }

    #[test]
    fn test_blur_on_empty_cell_writes_nothing() {
        let engine = GridEngine::new();
        engine.on_double_click(4, 4);
        assert!(!engine.on_editor_blur());
        assert_eq!(engine.export_cells().unwrap(), "{}");
    }

    #[test]
    fn test_populate_viewport() {
        let mut engine = GridEngine::new();
        engine.on_double_click(1, 2);
        engine.on_editor_input("x".to_string()).unwrap();
        engine.on_editor_blur();

        engine.populate_viewport(0, 0, 4, 4);

        // anchor at (0, 0) plus the written cell
        assert_eq!(engine.get_viewport_len(), 2);
        assert_eq!(engine.viewport_buffer.rows, vec![0, 1]);
        assert_eq!(engine.viewport_buffer.cols, vec![0, 2]);
        assert_eq!(engine.viewport_buffer.flags, vec![0b011, 0]);
        assert_eq!(engine.get_viewport_texts(), r#"["","x"]"#);

        engine.populate_viewport(0, 0, 0, 4);
        assert_eq!(engine.get_viewport_len(), 0);
    }

    #[test]
    fn test_windows_are_cut_to_the_grid() {
        let mut engine = GridEngine::from_config_json(r#"{"rowCount": 2, "columnCount": 2}"#)
            .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(views(&engine, 0, 0, 100, 100).len(), 4);
        assert_eq!(views(&engine, 1, 0, u32::MAX, 1).len(), 1);
        assert!(views(&engine, u32::MAX, 0, 2, 1).is_empty());
        assert!(views(&engine, 0, 2, 1, 1).is_empty());

        engine.populate_viewport(0, 0, u32::MAX, u32::MAX);
        assert_eq!(engine.get_viewport_len(), 1);
        engine.populate_viewport(5, 5, 3, 3);
        assert_eq!(engine.get_viewport_len(), 0);
    }

    #[test]
    fn test_scroll_target() {
        let engine = GridEngine::new();
        engine.set_visible_range(0, 0, 1, 1);
        let mut state = engine.state.borrow_mut();
        state.key_down(&Key::ArrowDown, KeyOrigin::Document);
        state.key_up(&Key::ArrowDown, KeyOrigin::Document);
        drop(state);
        assert_eq!(engine.take_scroll_target(), Some(vec![1, 0]));
        assert_eq!(engine.take_scroll_target(), None);
    }

    #[test]
    fn test_export_import_round_trip() {
        let engine = GridEngine::new();
        engine.import_cells(r#"{"2,3":"x","0,0":"a"}"#).unwrap();
        assert_eq!(engine.get_cell_value(2, 3), Some("x".to_string()));
        assert_eq!(engine.export_cells().unwrap(), r#"{"0,0":"a","2,3":"x"}"#);
    }
}
