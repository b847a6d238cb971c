//! In-memory view of the tabular response store.

use serde_json::{Map, Value};

/// Header plus string rows. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Append a row given as `(column, value)` pairs.
    ///
    /// Columns not yet in the header are added at the end and back-filled
    /// with empty cells; header columns missing from `cells` stay empty.
    pub fn push(&mut self, cells: Vec<(String, String)>) {
        for (column, _) in &cells {
            if self.column_index(column).is_none() {
                self.headers.push(column.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mut row = vec![String::new(); self.headers.len()];
        for (column, value) in cells {
            if let Some(idx) = self.column_index(&column) {
                row[idx] = value;
            }
        }
        self.rows.push(row);
    }

    /// Row `index` as a JSON object keyed by column name.
    pub fn row_object(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(index)?;
        Some(
            self.headers
                .iter()
                .zip(row)
                .map(|(h, v)| (h.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}
