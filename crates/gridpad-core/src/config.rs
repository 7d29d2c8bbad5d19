use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::position::CellPosition;
use crate::state::input::{default_bindings, KeyBinding};

/// Default number of logical rows handed to the virtualized renderer
pub const DEFAULT_ROW_COUNT: usize = 1_000_000;
/// Default number of logical columns handed to the virtualized renderer
pub const DEFAULT_COLUMN_COUNT: usize = 1_000;

/// Alternating track size: even indices use `even`, odd indices use `odd` (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePattern {
    pub even: f64,
    pub odd: f64,
}

impl SizePattern {
    pub const fn new(even: f64, odd: f64) -> Self {
        Self { even, odd }
    }

    pub const fn uniform(size: f64) -> Self {
        Self {
            even: size,
            odd: size,
        }
    }

    pub fn size(&self, index: usize) -> f64 {
        if index % 2 == 1 {
            self.odd
        } else {
            self.even
        }
    }

    /// Pixel offset of the leading edge of track `index`
    pub fn offset(&self, index: usize) -> f64 {
        let evens = index.div_ceil(2) as f64;
        let odds = (index / 2) as f64;
        evens * self.even + odds * self.odd
    }

    /// Track index containing pixel offset `px`
    pub fn index_at(&self, px: f64) -> usize {
        if px <= 0.0 {
            return 0;
        }
        let pair = self.even + self.odd;
        let pairs = (px / pair).floor();
        let rem = px - pairs * pair;
        let index = pairs as usize * 2;
        if rem >= self.even {
            index + 1
        } else {
            index
        }
    }

    fn is_valid(&self) -> bool {
        self.even.is_finite() && self.odd.is_finite() && self.even > 0.0 && self.odd > 0.0
    }
}

/// What happens to an unconfirmed draft when editing moves to another cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditSwitch {
    /// Drop the draft; the previous cell keeps its stored value
    #[default]
    Discard,
    /// Write the draft as if the user had confirmed it
    Commit,
}

/// Grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub row_count: usize,
    pub column_count: usize,
    pub row_height: SizePattern,
    pub column_width: SizePattern,
    pub edit_switch: EditSwitch,
    pub bindings: Vec<KeyBinding>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            column_count: DEFAULT_COLUMN_COUNT,
            row_height: SizePattern::new(30.0, 40.0),
            column_width: SizePattern::new(80.0, 100.0),
            edit_switch: EditSwitch::Discard,
            bindings: default_bindings(),
        }
    }
}

impl GridConfig {
    /// Small grid, mostly for tests and demos
    pub fn with_extent(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let reject = |reason: String| {
            tracing::warn!(%reason, "rejecting grid configuration");
            Err(GridError::InvalidConfig(reason))
        };

        if self.row_count == 0 || self.column_count == 0 {
            return reject(format!(
                "grid extent must be non-empty, got {}x{}",
                self.row_count, self.column_count
            ));
        }
        if !self.row_height.is_valid() || !self.column_width.is_valid() {
            return reject("row heights and column widths must be positive".to_string());
        }
        if let Some(binding) = self.bindings.iter().find(|b| b.keys.is_empty()) {
            return reject(format!("binding for {:?} has no keys", binding.action));
        }
        Ok(())
    }

    pub fn max_row(&self) -> usize {
        self.row_count - 1
    }

    pub fn max_col(&self) -> usize {
        self.column_count - 1
    }

    /// Bottom-right cell of the grid
    pub fn last_cell(&self) -> CellPosition {
        CellPosition::new(self.max_row(), self.max_col())
    }

    /// Pull `pos` back inside the grid extent
    pub fn clamp(&self, pos: CellPosition) -> CellPosition {
        CellPosition::new(pos.row.min(self.max_row()), pos.col.min(self.max_col()))
    }
}
