//! Gemini `generateContent` REST backend.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};
use crate::error::LlmError;

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider speaking the public REST API over `reqwest`.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            return Err(LlmError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after,
            });
        }

        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP {status}: {}", text.chars().take(500).collect::<String>()),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = build_body(
            &request.messages,
            &[],
            request.max_tokens,
            request.temperature,
        );
        let parsed = parse_response(&self.generate(body).await?)?;
        Ok(CompletionResponse {
            content: parsed.content.unwrap_or_default(),
            input_tokens: parsed.input_tokens,
            output_tokens: parsed.output_tokens,
            finish_reason: parsed.finish_reason,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let body = build_body(
            &request.messages,
            &request.tools,
            request.max_tokens,
            request.temperature,
        );
        parse_response(&self.generate(body).await?)
    }
}

/// Translate chat messages into a `generateContent` request body.
///
/// System messages are merged into `systemInstruction`. Consecutive tool
/// results become `functionResponse` parts of a single user turn.
pub(crate) fn build_body(
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
    max_tokens: Option<u32>,
    temperature: Option<f32>,
) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let mut contents: Vec<Value> = Vec::new();
    // Index of the open function-response turn, if the last turn is one.
    let mut open_responses: Option<usize> = None;
    for m in messages {
        match m.role {
            // Already folded into `systemInstruction`.
            Role::System => {}
            Role::Tool => {
                let part = json!({
                    "functionResponse": {
                        "name": m.name.clone().unwrap_or_default(),
                        "response": {"content": m.content}
                    }
                });
                // Gemini wants every answer to one model turn in a single user turn.
                match open_responses.and_then(|i| contents[i]["parts"].as_array_mut()) {
                    Some(parts) => parts.push(part),
                    None => {
                        open_responses = Some(contents.len());
                        contents.push(json!({"role": "user", "parts": [part]}));
                    }
                }
            }
            Role::User => {
                open_responses = None;
                contents.push(json!({"role": "user", "parts": [{"text": m.content}]}));
            }
            Role::Assistant => {
                open_responses = None;
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(json!({"text": m.content}));
                }
                for call in &m.tool_calls {
                    parts.push(json!({
                        "functionCall": {"name": call.name, "args": call.arguments}
                    }));
                }
                contents.push(json!({"role": "model", "parts": parts}));
            }
        }
    }

    let mut body = json!({ "contents": contents });

    if !system.is_empty() {
        body["systemInstruction"] = json!({"parts": [{"text": system.join("\n\n")}]});
    }

    if !tools.is_empty() {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                let mut decl = json!({
                    "name": t.name,
                    "description": t.description,
                });
                // Gemini rejects OBJECT schemas with no properties.
                let has_properties = t
                    .parameters
                    .get("properties")
                    .and_then(|p| p.as_object())
                    .is_some_and(|p| !p.is_empty());
                if has_properties {
                    decl["parameters"] = t.parameters.clone();
                }
                decl
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    let mut generation = serde_json::Map::new();
    if let Some(max) = max_tokens {
        generation.insert("maxOutputTokens".to_string(), json!(max));
    }
    if let Some(t) = temperature {
        generation.insert("temperature".to_string(), json!(t));
    }
    if !generation.is_empty() {
        body["generationConfig"] = Value::Object(generation);
    }

    body
}

/// Extract text, function calls and usage from a `generateContent` reply.
pub(crate) fn parse_response(body: &Value) -> Result<ToolCompletionResponse, LlmError> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "no candidates in response".to_string(),
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .cloned()
        .unwrap_or_default();

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            texts.push(text.to_string());
        }
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| LlmError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    reason: "functionCall without name".to_string(),
                })?;
            tool_calls.push(ToolCall {
                id: format!("call_{i}_{name}"),
                name: name.to_string(),
                arguments: call.get("args").cloned().unwrap_or_else(|| json!({})),
            });
        }
    }

    let finish_reason = if !tool_calls.is_empty() {
        FinishReason::ToolUse
    } else {
        match candidate.get("finishReason").and_then(|f| f.as_str()) {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Unknown,
        }
    };

    let usage = body.get("usageMetadata");
    let token_count = |key: &str| {
        usage
            .and_then(|u| u.get(key))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    };

    Ok(ToolCompletionResponse {
        content: if texts.is_empty() {
            None
        } else {
            Some(texts.join(""))
        },
        tool_calls,
        input_tokens: token_count("promptTokenCount"),
        output_tokens: token_count("candidatesTokenCount"),
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_moves_system_prompt_out_of_contents() {
        let messages = vec![
            ChatMessage::system("You are a data analyst."),
            ChatMessage::user("How many attendees?"),
        ];
        let body = build_body(&messages, &[], None, None);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a data analyst."
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert!(body.get("tools").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn body_encodes_tool_round_trip() {
        let call = ToolCall {
            id: "call_0_count_values".to_string(),
            name: "count_values".to_string(),
            arguments: json!({"column": "Domain"}),
        };
        let messages = vec![
            ChatMessage::user("Top domains?"),
            ChatMessage::assistant_with_tool_calls(None, vec![call]),
            ChatMessage::tool_result("call_0_count_values", "count_values", "{\"Finance\": 3}"),
        ];
        let tools = vec![ToolDefinition {
            name: "count_values".to_string(),
            description: "Count unique values in a column.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"column": {"type": "string"}},
                "required": ["column"]
            }),
        }];
        let body = build_body(&messages, &tools, Some(512), Some(0.2));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["name"], "count_values");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"]["column"], "Domain");
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"]["response"]["content"],
            "{\"Finance\": 3}"
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "count_values"
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["parameters"]["required"][0],
            "column"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn parallel_tool_results_share_one_turn() {
        let calls = vec![
            ToolCall {
                id: "call_0_count_values".to_string(),
                name: "count_values".to_string(),
                arguments: json!({"column": "Domain"}),
            },
            ToolCall {
                id: "call_1_get_dataset_info".to_string(),
                name: "get_dataset_info".to_string(),
                arguments: json!({}),
            },
        ];
        let messages = vec![
            ChatMessage::user("Overview please"),
            ChatMessage::assistant_with_tool_calls(None, calls),
            ChatMessage::tool_result("call_0_count_values", "count_values", "{\"Finance\": 3}"),
            ChatMessage::tool_result("call_1_get_dataset_info", "get_dataset_info", "Shape: (3, 10)"),
            ChatMessage::assistant("Finance leads."),
            ChatMessage::user("And experience?"),
        ];
        let body = build_body(&messages, &[], None, None);

        let contents = body["contents"].as_array().unwrap();
        let roles: Vec<&str> = contents.iter().map(|c| c["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user", "model", "user"]);
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 2);

        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["functionResponse"]["name"], "count_values");
        assert_eq!(responses[1]["functionResponse"]["name"], "get_dataset_info");
        assert_eq!(contents[4]["parts"][0]["text"], "And experience?");
    }

    #[test]
    fn parameterless_tools_omit_schema() {
        let tools = vec![ToolDefinition {
            name: "get_dataset_info".to_string(),
            description: "Columns and shape.".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }];
        let body = build_body(&[ChatMessage::user("hi")], &tools, None, None);
        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "get_dataset_info");
        assert!(decl.get("parameters").is_none());
    }

    #[test]
    fn parse_text_response() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        });
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.content.as_deref(), Some("Hello there"));
        assert!(parsed.tool_calls.is_empty());
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
        assert_eq!(parsed.input_tokens, 12);
        assert_eq!(parsed.output_tokens, 3);
    }

    #[test]
    fn parse_function_call_response() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"name": "cross_tabulate", "args": {"row_col": "AI_Experience", "col_col": "Programming_Confidence"}}}
                ]},
                "finishReason": "STOP"
            }]
        });
        let parsed = parse_response(&body).unwrap();
        assert!(parsed.content.is_none());
        assert_eq!(parsed.finish_reason, FinishReason::ToolUse);
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "cross_tabulate");
        assert_eq!(parsed.tool_calls[0].arguments["row_col"], "AI_Experience");
    }

    #[test]
    fn parse_without_candidates_is_invalid() {
        let err = parse_response(&json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn base_url_is_normalised() {
        let provider = GeminiProvider::new(SecretString::from("k"), "gemini-2.5-flash")
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(provider.model_name(), "gemini-2.5-flash");
    }
}
