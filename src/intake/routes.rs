//! REST endpoints for the attendee chat and demo reset.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use super::flow::{IntakeFlow, IntakeRequest};
use super::model::Identity;
use crate::report::ReportWriter;

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub flow: Arc<IntakeFlow>,
    /// Rendered report, removed on reset alongside the response store.
    pub report: Arc<ReportWriter>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub request: IntakeRequest,
    #[serde(default)]
    pub user_data: Option<Identity>,
}

/// POST /api/chat
///
/// Routes one attendee message through the intake flow.
async fn chat(
    State(state): State<IntakeRouteState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    match state
        .flow
        .respond(&body.user_id, body.request, body.user_data)
        .await
    {
        Ok(reply) => Json(serde_json::json!({ "response": reply.text })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// POST /api/reset
///
/// Drops every session and deletes the response store and report. Every
/// step runs; the first failure is reported.
async fn reset(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    let flow_result = state.flow.reset().await;
    let report_result = state.report.remove().await;
    match flow_result.and(report_result) {
        Ok(()) => Json(serde_json::json!({ "status": "reset" })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/reset", post(reset))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::script::Question;
    use crate::intake::session::{InMemorySessionStore, SessionStore};
    use crate::store::{CsvResponseStore, ResponseStore};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> (Router, Arc<IntakeFlow>) {
        let flow = Arc::new(IntakeFlow::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(CsvResponseStore::new(dir.path().join("responses.csv"))),
        ));
        let report = Arc::new(ReportWriter::new(dir.path().join("report.txt")));
        let router = intake_routes(IntakeRouteState {
            flow: flow.clone(),
            report,
        });
        (router, flow)
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn chat_start_session_greets() {
        let dir = TempDir::new().unwrap();
        let (router, _) = app(&dir);
        let (status, json) = post_json(
            &router,
            "/api/chat",
            serde_json::json!({
                "user_id": "u1",
                "request": {"type": "start_session"},
                "user_data": {"name": "Test User", "email": "test@example.com"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = json["response"].as_str().unwrap();
        assert!(text.starts_with("Hi Test User!"));
        assert!(text.ends_with(Question::Expectation.prompt()));
    }

    #[tokio::test]
    async fn chat_answer_advances() {
        let dir = TempDir::new().unwrap();
        let (router, flow) = app(&dir);
        post_json(
            &router,
            "/api/chat",
            serde_json::json!({"user_id": "u1", "request": {"type": "start_session"}}),
        )
        .await;
        let (_, json) = post_json(
            &router,
            "/api/chat",
            serde_json::json!({
                "user_id": "u1",
                "request": {"type": "answer", "text": "I want to learn"}
            }),
        )
        .await;
        assert_eq!(json["response"], Question::Domain.prompt());
        assert_eq!(flow.sessions().len().await, 1);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (router, _) = app(&dir);
        let response = router
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "START_SESSION"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let dir = TempDir::new().unwrap();
        let (router, flow) = app(&dir);
        post_json(
            &router,
            "/api/chat",
            serde_json::json!({"user_id": "u1", "request": {"type": "start_session"}}),
        )
        .await;

        let (status, json) = post_json(&router, "/api/reset", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "reset");
        assert_eq!(flow.sessions().len().await, 0);
        assert!(flow.responses().load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_keeps_going_after_store_failure() {
        let dir = TempDir::new().unwrap();
        // A directory where the store file should be cannot be removed as a file.
        std::fs::create_dir(dir.path().join("responses.csv")).unwrap();
        std::fs::write(dir.path().join("report.txt"), "old report").unwrap();
        let (router, flow) = app(&dir);
        post_json(
            &router,
            "/api/chat",
            serde_json::json!({"user_id": "u1", "request": {"type": "start_session"}}),
        )
        .await;

        let (status, json) = post_json(&router, "/api/reset", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("responses.csv"));
        assert_eq!(flow.sessions().len().await, 0);
        assert!(!dir.path().join("report.txt").exists());
    }
}
