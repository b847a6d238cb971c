//! Dataset tools: read-only lookups over the persisted intake responses.
//!
//! Each tool loads the store fresh on every call so the model always sees
//! the latest rows.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::analytics::dataset::{self, DatasetError};
use crate::store::{ResponseStore, Table};
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

/// Default and maximum row count for `get_raw_data`.
const DEFAULT_RAW_LIMIT: u64 = 5;
const MAX_RAW_LIMIT: u64 = 500;

async fn load(store: &dyn ResponseStore) -> Result<Option<Table>, ToolError> {
    store
        .load()
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("Could not read responses: {e}")))
}

async fn load_existing(store: &dyn ResponseStore) -> Result<Table, ToolError> {
    load(store)
        .await?
        .ok_or_else(|| ToolError::ExecutionFailed("Data file does not exist.".to_string()))
}

fn dataset_err(e: DatasetError) -> ToolError {
    ToolError::ExecutionFailed(e.to_string())
}

// ── get_dataset_info ────────────────────────────────────────────────

pub struct DatasetInfoTool {
    store: Arc<dyn ResponseStore>,
}

impl DatasetInfoTool {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DatasetInfoTool {
    fn name(&self) -> &str {
        "get_dataset_info"
    }

    fn description(&self) -> &str {
        "Returns the column names, shape, and a two-row sample of the workshop \
         responses. Call this first to learn which columns exist."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let table = load(self.store.as_ref()).await?;
        Ok(ToolOutput::text(
            dataset::dataset_info(table.as_ref()),
            start.elapsed(),
        ))
    }
}

// ── count_values ────────────────────────────────────────────────────

pub struct CountValuesTool {
    store: Arc<dyn ResponseStore>,
}

impl CountValuesTool {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CountValuesTool {
    fn name(&self) -> &str {
        "count_values"
    }

    fn description(&self) -> &str {
        "Counts how often each distinct value appears in a column, most frequent first."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "column": {
                    "type": "string",
                    "description": "Column name, e.g. 'Domain' or 'AI_Experience'"
                }
            },
            "required": ["column"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let column = require_str(&params, "column")?;
        let table = load_existing(self.store.as_ref()).await?;
        let counts = dataset::count_values(&table, column).map_err(dataset_err)?;
        Ok(ToolOutput::success(counts.to_json(), start.elapsed()))
    }
}

// ── filter_and_count ────────────────────────────────────────────────

pub struct FilterAndCountTool {
    store: Arc<dyn ResponseStore>,
}

impl FilterAndCountTool {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FilterAndCountTool {
    fn name(&self) -> &str {
        "filter_and_count"
    }

    fn description(&self) -> &str {
        "Keeps rows whose filter column contains the filter value (case-insensitive), \
         then counts the values of another column in those rows."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filter_col": {
                    "type": "string",
                    "description": "Column to filter on"
                },
                "filter_val": {
                    "type": "string",
                    "description": "Substring to look for in the filter column"
                },
                "count_col": {
                    "type": "string",
                    "description": "Column whose values are counted"
                }
            },
            "required": ["filter_col", "filter_val", "count_col"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let filter_col = require_str(&params, "filter_col")?;
        let filter_val = require_str(&params, "filter_val")?;
        let count_col = require_str(&params, "count_col")?;

        let table = load_existing(self.store.as_ref()).await?;
        let counts = dataset::filter_and_count(&table, filter_col, filter_val, count_col)
            .map_err(dataset_err)?;

        let output = match counts {
            Some(counts) => ToolOutput::success(counts.to_json(), start.elapsed()),
            None => {
                tracing::debug!(filter_col, filter_val, "Filter matched no rows");
                ToolOutput::text("No matching records found.", start.elapsed())
            }
        };
        Ok(output)
    }
}

// ── cross_tabulate ──────────────────────────────────────────────────

pub struct CrossTabulateTool {
    store: Arc<dyn ResponseStore>,
}

impl CrossTabulateTool {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CrossTabulateTool {
    fn name(&self) -> &str {
        "cross_tabulate"
    }

    fn description(&self) -> &str {
        "Counts co-occurrences of two columns, e.g. AI_Experience against \
         Programming_Confidence. Result is keyed by column value, then row value."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "row_col": {
                    "type": "string",
                    "description": "Column used for the inner keys"
                },
                "col_col": {
                    "type": "string",
                    "description": "Column used for the outer keys"
                }
            },
            "required": ["row_col", "col_col"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let row_col = require_str(&params, "row_col")?;
        let col_col = require_str(&params, "col_col")?;

        let table = load_existing(self.store.as_ref()).await?;
        let tab = dataset::cross_tabulate(&table, row_col, col_col).map_err(dataset_err)?;
        let json = serde_json::to_value(tab)
            .map_err(|e| ToolError::ExecutionFailed(format!("Could not encode table: {e}")))?;
        Ok(ToolOutput::success(json, start.elapsed()))
    }
}

// ── get_raw_data ────────────────────────────────────────────────────

pub struct RawDataTool {
    store: Arc<dyn ResponseStore>,
}

impl RawDataTool {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RawDataTool {
    fn name(&self) -> &str {
        "get_raw_data"
    }

    fn description(&self) -> &str {
        "Returns the first rows of the responses as JSON objects. Use it to read \
         free-text answers such as Project_Idea."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Max rows (default: 5, max: 500)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_RAW_LIMIT)
            .min(MAX_RAW_LIMIT) as usize;

        let table = load_existing(self.store.as_ref()).await?;
        let rows = dataset::raw_data(&table, limit);
        Ok(ToolOutput::success(
            serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect()),
            start.elapsed(),
        ))
    }
}
