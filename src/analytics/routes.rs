//! Admin REST endpoints: analyst chat, full analysis and report download.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::agent::AnalyticsAgent;
use crate::report::ReportWriter;

/// Thread used when the dashboard does not send one.
pub const DEFAULT_THREAD_ID: &str = "admin_dashboard";

#[derive(Clone)]
pub struct AnalyticsRouteState {
    pub agent: Arc<AnalyticsAgent>,
    pub report: Arc<ReportWriter>,
}

/// Body of `POST /api/admin/chat`.
#[derive(Debug, Deserialize)]
pub struct AdminChatRequest {
    pub question: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

fn internal_error(e: impl std::fmt::Display) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

/// POST /api/admin/chat
async fn admin_chat(
    State(state): State<AnalyticsRouteState>,
    Json(body): Json<AdminChatRequest>,
) -> impl IntoResponse {
    let thread_id = body.thread_id.as_deref().unwrap_or(DEFAULT_THREAD_ID);
    let answer = state.agent.query(&body.question, thread_id).await;
    Json(serde_json::json!({ "answer": answer }))
}

/// DELETE /api/admin/chat/{thread_id}
async fn end_admin_thread(
    State(state): State<AnalyticsRouteState>,
    Path(thread_id): Path<String>,
) -> impl IntoResponse {
    let cleared = state.agent.forget(&thread_id).await;
    tracing::info!(thread_id, cleared, "Admin chat thread ended");
    Json(serde_json::json!({ "thread_id": thread_id, "cleared": cleared }))
}

/// POST /api/analyze
///
/// Builds the summary, writes the report and returns both.
async fn analyze(State(state): State<AnalyticsRouteState>) -> impl IntoResponse {
    let summary = match state.agent.analyze().await {
        Ok(summary) => summary,
        Err(e) => return internal_error(e),
    };
    match state.report.write_report(&summary).await {
        Ok(report) => Json(serde_json::json!({
            "analytics": summary,
            "report": report,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/report
async fn download_report(State(state): State<AnalyticsRouteState>) -> impl IntoResponse {
    match state.report.read().await {
        Ok(Some(text)) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No report has been generated yet" })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// Build the admin analytics routes.
pub fn analytics_routes(state: AnalyticsRouteState) -> Router {
    Router::new()
        .route("/api/admin/chat", post(admin_chat))
        .route("/api/admin/chat/{thread_id}", delete(end_admin_thread))
        .route("/api/analyze", post(analyze))
        .route("/api/report", get(download_report))
        .with_state(state)
}
