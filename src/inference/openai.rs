use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::InferenceProvider;
use crate::error::InferenceError;
use crate::types::{InferenceRequest, InferenceResponse, Message, ToolCall, Usage};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// OpenAI-compatible provider. Works with Groq, OpenAI, OpenRouter, vLLM,
/// or any server that implements the `/v1/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Groq's OpenAI-compatible endpoint.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(GROQ_BASE_URL).with_api_key(api_key)
    }

    /// Set an API key (required for Groq, OpenAI, OpenRouter, etc.).
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Convert registry tool schemas to OpenAI function-calling format.
    fn convert_tools(tools: &[Value]) -> Vec<Value> {
        tools
            .iter()
            .filter_map(|tool| {
                let name = tool["name"].as_str()?;
                let description = tool.get("description").cloned().unwrap_or(Value::Null);
                let parameters = tool
                    .get("input_schema")
                    .cloned()
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

                Some(json!({
                    "type": "function",
                    "function": {
                        "name": name,
                        "description": description,
                        "parameters": parameters,
                    }
                }))
            })
            .collect()
    }

    /// Convert a transcript to OpenAI chat format.
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => json!({ "role": "system", "content": content }),
                Message::User { content } => json!({ "role": "user", "content": content }),
                Message::Assistant { content, tool_call } => {
                    let mut out = json!({ "role": "assistant", "content": content });
                    if let Some(call) = tool_call {
                        out["tool_calls"] = json!([{
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments,
                            }
                        }]);
                    }
                    out
                }
                Message::ToolResult {
                    call_id, content, ..
                } => json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": content,
                }),
            })
            .collect()
    }

    fn parse_response(parsed: &Value) -> Result<InferenceResponse, InferenceError> {
        let message = parsed["choices"]
            .get(0)
            .map(|c| &c["message"])
            .ok_or_else(|| InferenceError::Parse("response has no choices".into()))?;

        let text = message["content"].as_str().unwrap_or("").to_string();

        // One tool call per turn; anything beyond the first is dropped.
        let calls = message["tool_calls"].as_array().cloned().unwrap_or_default();
        if calls.len() > 1 {
            debug!(count = calls.len(), "model requested several tools, keeping the first");
        }
        let tool_call = calls.first().map(|tc| {
            let arguments = match &tc["function"]["arguments"] {
                Value::String(s) => s.clone(),
                Value::Null => "{}".to_string(),
                other => other.to_string(),
            };
            ToolCall {
                id: tc["id"].as_str().unwrap_or("").to_string(),
                name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                arguments,
            }
        });

        let usage = Usage {
            input_tokens: parsed["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: parsed["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(InferenceResponse {
            text,
            tool_call,
            usage,
        })
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let messages = Self::convert_messages(&request.messages);

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if !request.tools.is_empty() {
            body["tools"] = Value::Array(Self::convert_tools(&request.tools));
        }

        debug!(
            model = %request.model,
            messages = messages.len(),
            "chat completion request"
        );

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("authorization", format!("Bearer {key}"));
        }

        let resp = req
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        if status != 200 {
            return Err(InferenceError::ApiError { status, body: text });
        }

        let parsed: Value =
            serde_json::from_str(&text).map_err(|e| InferenceError::Parse(e.to_string()))?;

        Self::parse_response(&parsed)
    }
}
