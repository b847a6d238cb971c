//! Service wiring: stores, intake flow, analytics agent and the HTTP router.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::analytics::{AnalyticsAgent, AnalyticsRouteState, SummaryBuilder, analytics_routes};
use crate::config::AppConfig;
use crate::intake::{InMemorySessionStore, IntakeFlow, IntakeRouteState, intake_routes};
use crate::llm::LlmProvider;
use crate::report::ReportWriter;
use crate::store::{CsvResponseStore, ResponseStore};
use crate::tools::ToolRegistry;

/// Shared services behind the router.
pub struct App {
    pub flow: Arc<IntakeFlow>,
    pub agent: Arc<AnalyticsAgent>,
    pub report: Arc<ReportWriter>,
    pub responses: Arc<dyn ResponseStore>,
}

impl App {
    /// Wire every service from `config`. `llm` is `None` when no API key is set.
    pub fn new(config: &AppConfig, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        let responses: Arc<dyn ResponseStore> =
            Arc::new(CsvResponseStore::new(config.responses_file.clone()));
        let report = Arc::new(ReportWriter::new(config.report_file.clone()));

        let flow = Arc::new(IntakeFlow::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::clone(&responses),
        ));

        let summaries = Arc::new(SummaryBuilder::new(Arc::clone(&responses), llm.clone()));
        let tools = Arc::new(ToolRegistry::new());
        tools.register_analytics_tools(
            Arc::clone(&responses),
            Arc::clone(&summaries),
            Arc::clone(&report),
        );
        tracing::info!(tools = tools.count(), "Registered analytics tools");

        let agent = Arc::new(AnalyticsAgent::new(
            llm,
            tools,
            summaries,
            config.max_tool_iterations,
        ));

        Self {
            flow,
            agent,
            report,
            responses,
        }
    }

    /// Full HTTP surface with permissive CORS.
    pub fn router(&self) -> Router {
        intake_routes(IntakeRouteState {
            flow: Arc::clone(&self.flow),
            report: Arc::clone(&self.report),
        })
        .merge(analytics_routes(AnalyticsRouteState {
            agent: Arc::clone(&self.agent),
            report: Arc::clone(&self.report),
        }))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
    }
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
