use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tools::ToolSchema;

/// One message on the chat wire. Mirrors the OpenAI-compatible
/// `chat/completions` message object: assistant replies carry either text
/// content or tool calls, tool results echo the call id they answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text("assistant", content)
    }

    pub fn tool_result(call_id: impl Into<String>, payload: &Value) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(payload.to_string()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, exactly as the service emits it.
    pub arguments: String,
}

impl ToolCall {
    pub fn parsed_arguments(&self) -> Result<Value> {
        serde_json::from_str::<Value>(&self.function.arguments).with_context(|| {
            format!(
                "tool call '{}' carried unparseable arguments",
                self.function.name
            )
        })
    }
}

/// External inference capability. Given a message history and the tool
/// schemas declared for the calling agent, returns either a natural-language
/// assistant message or a tool-invocation request.
#[async_trait]
pub trait InferenceService: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSchema])
    -> Result<ChatMessage>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible HTTP inference client. Works against api.openai.com,
/// Groq, and Ollama's `/v1` endpoint with the same wire shape.
pub struct HttpInference {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpInference {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build inference HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl InferenceService for HttpInference {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            let declarations = tools
                .iter()
                .map(|schema| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": schema.name,
                            "description": schema.description,
                            "parameters": schema.parameters,
                        }
                    })
                })
                .collect::<Vec<Value>>();
            body["tools"] = Value::Array(declarations);
        }

        tracing::debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "inference request");

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("failed to send request to inference service")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("inference service returned {}: {}", status, error_text);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to parse inference service response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow::anyhow!("inference service returned no choices"))
    }
}
