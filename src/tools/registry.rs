//! Tool registry for managing available tools.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::analytics::SummaryBuilder;
use crate::llm::ToolDefinition;
use crate::report::ReportWriter;
use crate::store::ResponseStore;
use crate::tools::builtin::dataset::{
    CountValuesTool, CrossTabulateTool, DatasetInfoTool, FilterAndCountTool, RawDataTool,
};
use crate::tools::builtin::report::GenerateReportTool;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Registry of available tools.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool at startup, replacing any tool with the same name.
    pub fn register_sync(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.tools.try_write() {
            Ok(mut tools) => {
                if tools.insert(name.clone(), tool).is_some() {
                    tracing::warn!(tool = %name, "Replaced existing tool registration");
                }
                tracing::debug!("Registered tool: {}", name);
            }
            Err(_) => tracing::warn!(tool = %name, "Registry busy, tool not registered"),
        }
    }

    /// Register the dataset lookup tools and the report generator.
    pub fn register_analytics_tools(
        &self,
        store: Arc<dyn ResponseStore>,
        summaries: Arc<SummaryBuilder>,
        report: Arc<ReportWriter>,
    ) {
        self.register_sync(Arc::new(DatasetInfoTool::new(Arc::clone(&store))));
        self.register_sync(Arc::new(CountValuesTool::new(Arc::clone(&store))));
        self.register_sync(Arc::new(FilterAndCountTool::new(Arc::clone(&store))));
        self.register_sync(Arc::new(CrossTabulateTool::new(Arc::clone(&store))));
        self.register_sync(Arc::new(RawDataTool::new(store)));
        self.register_sync(Arc::new(GenerateReportTool::new(summaries, report)));
    }

    /// Get a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.try_read().map(|t| t.len()).unwrap_or(0)
    }

    /// Run a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.get(name).await.ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;
        let output = tool.execute(params).await;
        match &output {
            Ok(out) => tracing::debug!(tool = name, elapsed_ms = out.duration.as_millis() as u64, "Tool succeeded"),
            Err(e) => tracing::warn!(tool = name, error = %e, "Tool failed"),
        }
        output
    }

    /// Get tool definitions for LLM function calling, sorted by name.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CsvResponseStore;
    use tempfile::TempDir;

    fn analytics_registry(dir: &TempDir) -> ToolRegistry {
        let store: Arc<dyn ResponseStore> =
            Arc::new(CsvResponseStore::new(dir.path().join("responses.csv")));
        let summaries = Arc::new(SummaryBuilder::new(Arc::clone(&store), None));
        let report = Arc::new(ReportWriter::new(dir.path().join("report.txt")));
        let registry = ToolRegistry::new();
        registry.register_analytics_tools(store, summaries, report);
        registry
    }

    #[tokio::test]
    async fn analytics_tools_are_advertised_in_order() {
        let dir = TempDir::new().unwrap();
        let registry = analytics_registry(&dir);
        assert_eq!(registry.count(), 6);

        let names: Vec<String> = registry
            .tool_definitions()
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "count_values",
                "cross_tabulate",
                "filter_and_count",
                "generate_report",
                "get_dataset_info",
                "get_raw_data",
            ]
        );
    }

    #[tokio::test]
    async fn schemas_declare_required_params() {
        let dir = TempDir::new().unwrap();
        let registry = analytics_registry(&dir);
        let filter = registry.get("filter_and_count").await.unwrap();
        let required = filter.parameters_schema()["required"].clone();
        assert_eq!(
            required,
            serde_json::json!(["filter_col", "filter_val", "count_col"])
        );
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let dir = TempDir::new().unwrap();
        let registry = analytics_registry(&dir);
        let out = registry
            .execute("get_dataset_info", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(out.to_llm_content(), "Data file does not exist.");
    }

    #[tokio::test]
    async fn execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound { ref name } if name == "missing"));
    }
}
