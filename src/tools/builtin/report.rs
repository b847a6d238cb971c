//! Report tool: runs the audience summary and writes the text report.

use std::sync::Arc;

use async_trait::async_trait;

use crate::analytics::SummaryBuilder;
use crate::report::ReportWriter;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Text returned to the model once the report is on disk.
pub const REPORT_READY: &str = "Report generated! [Download Report](/api/report)";

pub struct GenerateReportTool {
    summaries: Arc<SummaryBuilder>,
    writer: Arc<ReportWriter>,
}

impl GenerateReportTool {
    pub fn new(summaries: Arc<SummaryBuilder>, writer: Arc<ReportWriter>) -> Self {
        Self { summaries, writer }
    }
}

#[async_trait]
impl Tool for GenerateReportTool {
    fn name(&self) -> &str {
        "generate_report"
    }

    fn description(&self) -> &str {
        "Generate a comprehensive text report of the audience and get a download link."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();
        let summary = self
            .summaries
            .build()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Analysis failed: {e}")))?;
        self.writer
            .write_report(&summary)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Could not write report: {e}")))?;
        Ok(ToolOutput::text(REPORT_READY, start.elapsed()))
    }
}
