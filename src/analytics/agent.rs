//! AnalyticsAgent: answers admin questions about the collected responses
//! by letting the model call the dataset tools.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::summary::{AnalyticsSummary, SummaryBuilder};
use crate::error::{Error, LlmError};
use crate::llm::{ChatMessage, LlmProvider, ToolCompletionRequest};
use crate::tools::ToolRegistry;

/// Reply when no model is configured.
pub const NO_PROVIDER_MESSAGE: &str = "I need a Gemini API Key to answer questions.";

/// Reply when the tool loop hits its iteration bound.
pub const ITERATION_LIMIT_MESSAGE: &str =
    "I couldn't finish the analysis within the tool-call limit. Try a narrower question.";

const ANALYST_PROMPT: &str = "\
You are an expert Data Analyst for an AI Workshop.
Your goal is to provide deep, actionable insights, not just numbers.

When asked to analyze:
1. ALWAYS start by checking the dataset info.
2. Look for patterns using cross-tabulation (e.g., Experience vs Confidence, Domain vs Project Idea).
3. Read raw project ideas to identify themes.
4. Be proactive: if you see a trend, explain WHY it might be happening.
5. Use a professional but engaging tone.";

/// Tool-calling analyst with per-thread conversation memory.
pub struct AnalyticsAgent {
    llm: Option<Arc<dyn LlmProvider>>,
    tools: Arc<ToolRegistry>,
    summaries: Arc<SummaryBuilder>,
    max_iterations: usize,
    threads: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl AnalyticsAgent {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        tools: Arc<ToolRegistry>,
        summaries: Arc<SummaryBuilder>,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            summaries,
            max_iterations: max_iterations.max(1),
            threads: Mutex::new(HashMap::new()),
        }
    }

    /// Answer `question` in the conversation identified by `thread_id`.
    ///
    /// Never fails: provider errors are folded into the reply text.
    pub async fn query(&self, question: &str, thread_id: &str) -> String {
        let Some(ref llm) = self.llm else {
            return NO_PROVIDER_MESSAGE.to_string();
        };
        match self.run_tool_loop(llm.as_ref(), question, thread_id).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "Analytics query failed");
                format!("I encountered an error: {e}")
            }
        }
    }

    /// Full audience summary for the report writer.
    pub async fn analyze(&self) -> Result<AnalyticsSummary, Error> {
        self.summaries.build().await
    }

    /// Drop the conversation for `thread_id`. Returns whether one existed.
    pub async fn forget(&self, thread_id: &str) -> bool {
        self.threads.lock().await.remove(thread_id).is_some()
    }

    async fn run_tool_loop(
        &self,
        llm: &dyn LlmProvider,
        question: &str,
        thread_id: &str,
    ) -> Result<String, LlmError> {
        let mut history = self
            .threads
            .lock()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default();
        history.push(ChatMessage::user(question));

        let tools = self.tools.tool_definitions().await;

        for iteration in 0..self.max_iterations {
            let mut messages = Vec::with_capacity(history.len() + 1);
            messages.push(ChatMessage::system(ANALYST_PROMPT));
            messages.extend(history.iter().cloned());

            let request = ToolCompletionRequest::new(messages, tools.clone());
            let response = llm.complete_with_tools(request).await?;

            if response.tool_calls.is_empty() {
                let answer = response.content.unwrap_or_default();
                history.push(ChatMessage::assistant(answer.clone()));
                self.threads
                    .lock()
                    .await
                    .insert(thread_id.to_string(), history);
                return Ok(answer);
            }

            tracing::debug!(
                thread_id,
                iteration,
                calls = response.tool_calls.len(),
                "Model requested tools"
            );
            history.push(ChatMessage::assistant_with_tool_calls(
                response.content,
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                let content = match self.tools.execute(&call.name, call.arguments).await {
                    Ok(output) => output.to_llm_content(),
                    Err(e) => format!("Error: {e}"),
                };
                history.push(ChatMessage::tool_result(call.id, call.name, content));
            }
        }

        tracing::warn!(thread_id, max = self.max_iterations, "Tool loop hit iteration limit");
        history.push(ChatMessage::assistant(ITERATION_LIMIT_MESSAGE));
        self.threads
            .lock()
            .await
            .insert(thread_id.to_string(), history);
        Ok(ITERATION_LIMIT_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{
        CompletionRequest, CompletionResponse, FinishReason, Role, ToolCall,
        ToolCompletionResponse,
    };
    use crate::report::ReportWriter;
    use crate::store::{CsvResponseStore, ResponseRecord, ResponseStore};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Replays canned responses and records every request it saw.
    struct ScriptedLlm {
        replies: std::sync::Mutex<VecDeque<Result<ToolCompletionResponse, LlmError>>>,
        seen: std::sync::Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<ToolCompletionResponse, LlmError>>) -> Self {
            Self {
                replies: std::sync::Mutex::new(replies.into()),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    fn text(content: &str) -> Result<ToolCompletionResponse, LlmError> {
        Ok(ToolCompletionResponse {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
        })
    }

    fn call(name: &str, args: serde_json::Value) -> Result<ToolCompletionResponse, LlmError> {
        Ok(ToolCompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: format!("call_{name}"),
                name: name.to_string(),
                arguments: args,
            }],
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::ToolUse,
        })
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: "{}".to_string(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
        async fn complete_with_tools(
            &self,
            request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| text("out of script"))
        }
    }

    fn erased(llm: &Arc<ScriptedLlm>) -> Option<Arc<dyn LlmProvider>> {
        let llm: Arc<dyn LlmProvider> = llm.clone();
        Some(llm)
    }

    async fn agent_with(dir: &TempDir, llm: Option<Arc<dyn LlmProvider>>, max: usize) -> AnalyticsAgent {
        let store = CsvResponseStore::new(dir.path().join("responses.csv"));
        for domain in ["Finance", "Finance", "Retail"] {
            let answers = vec![
                "Learn agents".to_string(),
                domain.to_string(),
                "Some bot idea".to_string(),
                "High".to_string(),
                "Beginner".to_string(),
                "Hands-on labs".to_string(),
            ];
            store.append(&ResponseRecord::new(answers, None)).await.unwrap();
        }
        let store: Arc<dyn ResponseStore> = Arc::new(store);
        let summaries = Arc::new(SummaryBuilder::new(Arc::clone(&store), llm.clone()));
        let report = Arc::new(ReportWriter::new(dir.path().join("report.txt")));
        let tools = Arc::new(ToolRegistry::new());
        tools.register_analytics_tools(store, Arc::clone(&summaries), report);
        AnalyticsAgent::new(llm, tools, summaries, max)
    }

    #[tokio::test]
    async fn query_without_provider() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(&dir, None, 4).await;
        assert_eq!(agent.query("How many?", "admin").await, NO_PROVIDER_MESSAGE);
    }

    #[tokio::test]
    async fn tool_result_is_fed_back_to_model() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("count_values", serde_json::json!({"column": "Domain"})),
            text("Finance leads with 2 attendees."),
        ]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        let answer = agent.query("Top domain?", "admin").await;
        assert_eq!(answer, "Finance leads with 2 attendees.");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let tool_msg = seen[1].last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.name.as_deref(), Some("count_values"));
        assert!(tool_msg.content.contains("\"Finance\": 2"));
        assert_eq!(seen[0][0].role, Role::System);
    }

    #[tokio::test]
    async fn parallel_tool_calls_answer_one_model_turn() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(ToolCompletionResponse {
                content: None,
                tool_calls: vec![
                    ToolCall {
                        id: "call_1".to_string(),
                        name: "count_values".to_string(),
                        arguments: serde_json::json!({"column": "Domain"}),
                    },
                    ToolCall {
                        id: "call_2".to_string(),
                        name: "get_dataset_info".to_string(),
                        arguments: serde_json::json!({}),
                    },
                ],
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::ToolUse,
            }),
            text("Three attendees, mostly Finance."),
        ]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        let answer = agent.query("Who signed up?", "admin").await;
        assert_eq!(answer, "Three attendees, mostly Finance.");

        let seen = llm.seen.lock().unwrap();
        let second = &seen[1];
        let n = second.len();
        assert_eq!(second[n - 3].role, Role::Assistant);
        assert_eq!(second[n - 3].tool_calls.len(), 2);
        assert_eq!(second[n - 2].name.as_deref(), Some("count_values"));
        assert_eq!(second[n - 1].name.as_deref(), Some("get_dataset_info"));
        assert_eq!(second[n - 1].tool_call_id.as_deref(), Some("call_2"));

        // Both results travel back to the model in a single user turn.
        let body = crate::llm::gemini::build_body(second, &[], None, None);
        let contents = body["contents"].as_array().unwrap();
        let last = contents.last().unwrap();
        assert_eq!(last["role"], "user");
        assert_eq!(last["parts"].as_array().unwrap().len(), 2);
        assert_eq!(contents[contents.len() - 2]["role"], "model");
    }

    #[tokio::test]
    async fn tool_errors_are_reported_to_model() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("count_values", serde_json::json!({"column": "Salary"})),
            text("That column does not exist."),
        ]));
        let agent = agent_with(&dir, erased(&llm), 4).await;
        agent.query("Salary spread?", "admin").await;

        let seen = llm.seen.lock().unwrap();
        let tool_msg = seen[1].last().unwrap();
        assert!(tool_msg.content.starts_with("Error:"));
        assert!(tool_msg.content.contains("Salary"));
    }

    #[tokio::test]
    async fn thread_memory_carries_over() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![text("First."), text("Second.")]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        agent.query("one", "t1").await;
        agent.query("two", "t1").await;

        let seen = llm.seen.lock().unwrap();
        // system + user("one") + assistant("First.") + user("two")
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][2].content, "First.");
    }

    #[tokio::test]
    async fn separate_threads_do_not_share_memory() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![text("a"), text("b")]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        agent.query("one", "t1").await;
        agent.query("two", "t2").await;

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[1].len(), 2);
    }

    #[tokio::test]
    async fn forgotten_thread_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![text("First."), text("Again.")]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        agent.query("one", "t1").await;
        assert!(agent.forget("t1").await);
        assert!(!agent.forget("t1").await);
        agent.query("two", "t1").await;

        let seen = llm.seen.lock().unwrap();
        // system + user("two") only
        assert_eq!(seen[1].len(), 2);
    }

    #[tokio::test]
    async fn iteration_limit_stops_loop() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("get_dataset_info", serde_json::json!({})),
            call("get_dataset_info", serde_json::json!({})),
            call("get_dataset_info", serde_json::json!({})),
        ]));
        let agent = agent_with(&dir, erased(&llm), 2).await;

        let answer = agent.query("loop forever", "admin").await;
        assert_eq!(answer, ITERATION_LIMIT_MESSAGE);
        assert_eq!(llm.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn provider_error_is_folded_into_reply() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmError::AuthFailed {
            provider: "gemini".to_string(),
        })]));
        let agent = agent_with(&dir, erased(&llm), 4).await;

        let answer = agent.query("anything", "admin").await;
        assert!(answer.starts_with("I encountered an error:"));
        assert!(answer.contains("Authentication failed"));
    }

    #[tokio::test]
    async fn analyze_counts_participants() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(&dir, None, 4).await;
        let summary = agent.analyze().await.unwrap();
        assert_eq!(summary.total_participants, 3);
        assert_eq!(summary.top_domains["Finance"], 2);
    }
}
