//! Tabular lookups over persisted responses.
//!
//! These are the data functions behind the analytics tools. They never touch
//! the filesystem; callers load the [`Table`] first.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::store::Table;

/// Rows included in the `dataset_info` sample.
const SAMPLE_ROWS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("Column '{column}' not found. Available: {available:?}")]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Distinct values of a column with their frequency, most frequent first.
///
/// Empty cells are not counted. Ties are ordered by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueCounts(Vec<(String, usize)>);

impl ValueCounts {
    fn tally<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in values {
            let value = value.trim();
            if !value.is_empty() {
                *counts.entry(value).or_default() += 1;
            }
        }
        let mut sorted: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(v, n)| (v.to_string(), n))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self(sorted)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(v, n)| (v.as_str(), *n))
    }

    pub fn get(&self, value: &str) -> Option<usize> {
        self.iter().find(|(v, _)| *v == value).map(|(_, n)| n)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.0.iter().cloned().collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(v, n)| (v.clone(), Value::from(*n)))
                .collect(),
        )
    }
}

/// Contingency table: `column value → row value → count`.
pub type CrossTab = BTreeMap<String, BTreeMap<String, usize>>;

fn column<'a>(table: &'a Table, name: &str) -> Result<Vec<&'a str>, DatasetError> {
    table.column(name).ok_or_else(|| DatasetError::UnknownColumn {
        column: name.to_string(),
        available: table.headers.clone(),
    })
}

/// Columns, shape, and a two-row sample, as text for the model.
///
/// `None` means the store has not been created yet.
pub fn dataset_info(table: Option<&Table>) -> String {
    let Some(table) = table else {
        return "Data file does not exist.".to_string();
    };
    if table.is_empty() {
        return "Dataset is empty.".to_string();
    }

    let (rows, cols) = table.shape();
    let sample: Vec<Value> = (0..rows.min(SAMPLE_ROWS))
        .filter_map(|i| table.row_object(i).map(Value::Object))
        .collect();
    let sample = serde_json::to_string_pretty(&sample).unwrap_or_default();
    format!(
        "Columns: {:?}\nShape: ({rows}, {cols})\nSample:\n{sample}",
        table.headers
    )
}

/// Frequency of each distinct value in `column`.
pub fn count_values(table: &Table, column_name: &str) -> Result<ValueCounts, DatasetError> {
    Ok(ValueCounts::tally(column(table, column_name)?))
}

/// Keep rows whose `filter_col` contains `filter_val` (case-insensitive),
/// then count `count_col`. `None` when no row matches.
pub fn filter_and_count(
    table: &Table,
    filter_col: &str,
    filter_val: &str,
    count_col: &str,
) -> Result<Option<ValueCounts>, DatasetError> {
    let filter_values = column(table, filter_col)?;
    let count_values = column(table, count_col)?;
    let needle = filter_val.to_lowercase();

    let matched: Vec<&str> = filter_values
        .iter()
        .zip(&count_values)
        .filter(|(f, _)| f.to_lowercase().contains(&needle))
        .map(|(_, c)| *c)
        .collect();

    if matched.is_empty() {
        return Ok(None);
    }
    Ok(Some(ValueCounts::tally(matched)))
}

/// Count co-occurrences of `row_col` and `col_col` values.
///
/// Every distinct row value appears under every column value, with zero
/// where they never co-occur. Rows with an empty cell in either column are
/// skipped.
pub fn cross_tabulate(table: &Table, row_col: &str, col_col: &str) -> Result<CrossTab, DatasetError> {
    let rows = column(table, row_col)?;
    let cols = column(table, col_col)?;

    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .zip(&cols)
        .map(|(r, c)| (r.trim(), c.trim()))
        .filter(|(r, c)| !r.is_empty() && !c.is_empty())
        .collect();

    let row_values: BTreeSet<&str> = pairs.iter().map(|(r, _)| *r).collect();
    let mut tab = CrossTab::new();
    for (_, c) in &pairs {
        tab.entry(c.to_string()).or_insert_with(|| {
            row_values.iter().map(|r| (r.to_string(), 0)).collect()
        });
    }
    for (r, c) in pairs {
        if let Some(count) = tab.get_mut(c).and_then(|inner| inner.get_mut(r)) {
            *count += 1;
        }
    }
    Ok(tab)
}

/// First `limit` rows as JSON objects.
pub fn raw_data(table: &Table, limit: usize) -> Vec<Map<String, Value>> {
    (0..table.len().min(limit))
        .filter_map(|i| table.row_object(i))
        .collect()
}
