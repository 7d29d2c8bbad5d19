//! Sparse cell storage for the grid.
//!
//! Cells live in a two-level map (row index -> column index -> record). Only
//! cells that have been written are present, so memory follows the data the
//! user typed or pasted rather than the nominal extent of the grid.
//!
//! A record whose `value` is `None` has been cleared. Readers treat it exactly
//! like a cell that was never written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GridError, Result};
use crate::position::{CellPosition, CellRange};

/// A stored cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellRecord {
    pub value: Option<String>,
}

impl CellRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}

/// Sparse row/column mapping of written cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStore {
    rows: BTreeMap<usize, BTreeMap<usize, CellRecord>>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at a cell, `None` when missing or cleared
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(&row)?.get(&col)?.value.as_deref()
    }

    /// Value at a cell with empty cells rendered as `""`
    pub fn display(&self, row: usize, col: usize) -> &str {
        self.get(row, col).unwrap_or("")
    }

    /// Check whether a record (possibly cleared) exists at a cell
    pub fn has_record(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(&row)
            .is_some_and(|cols| cols.contains_key(&col))
    }

    /// Insert or overwrite a cell value. An empty string is still recorded.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .value = Some(value.into());
    }

    /// Clear the value of every existing record inside `range`.
    ///
    /// Records are kept (value-less) and coordinates without a record are
    /// skipped, so clearing a huge empty selection allocates nothing.
    /// Returns the number of cells whose value was removed.
    pub fn clear_range(&mut self, range: CellRange) -> usize {
        let cols = range.cols();
        let mut cleared = 0;
        for (_, row_cells) in self.rows.range_mut(range.rows()) {
            for (_, record) in row_cells.range_mut(cols.clone()) {
                if record.value.take().is_some() {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Drop cleared records and rows left without records
    pub fn prune(&mut self) {
        self.rows.retain(|_, cols| {
            cols.retain(|_, record| record.value.is_some());
            !cols.is_empty()
        });
    }

    /// Number of cells currently holding a value
    pub fn len(&self) -> usize {
        self.rows
            .values()
            .flat_map(|cols| cols.values())
            .filter(|record| record.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate cells holding a value in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellPosition, &str)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter().filter_map(move |(&col, record)| {
                record
                    .value
                    .as_deref()
                    .map(|value| (CellPosition::new(row, col), value))
            })
        })
    }

    /// Serialize to a JSON snapshot keyed by `"row,col"`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from a JSON snapshot produced by [`CellStore::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse a `"row,col"` snapshot key
pub fn parse_cell_key(key: &str) -> Result<CellPosition> {
    let invalid = || GridError::InvalidSnapshotKey(key.to_string());
    let (row, col) = key.split_once(',').ok_or_else(invalid)?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    let col = col.trim().parse().map_err(|_| invalid())?;
    Ok(CellPosition::new(row, col))
}

impl Serialize for CellStore {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        // Stringified tuple keys keep the snapshot valid JSON
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (pos, value) in self.iter() {
            map.serialize_entry(&format!("{},{}", pos.row, pos.col), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CellStore {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;
        use std::fmt;

        struct StoreVisitor;

        impl<'de> de::Visitor<'de> for StoreVisitor {
            type Value = CellStore;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of \"row,col\" keys to cell values")
            }

            fn visit_map<M>(self, mut access: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                let mut store = CellStore::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    let pos = parse_cell_key(&key).map_err(de::Error::custom)?;
                    store.set(pos.row, pos.col, value);
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}
