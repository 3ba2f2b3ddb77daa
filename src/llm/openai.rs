//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatMessage, ChatResponse, FinishReason, LlmClient, LlmError, ToolCall, ToolSchema, Usage};

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client. `timeout` bounds each completion request end to end.
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("persona-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let tools = tools.filter(|t| !t.is_empty());
        let body = CompletionRequest {
            model,
            messages,
            tools,
            tool_choice: tools.map(|_| "auto"),
        };

        tracing::debug!(
            model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Requesting chat completion"
        );

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let parsed: CompletionResponse = response.json().await?;
        into_chat_response(parsed)
    }
}

fn status_error(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(message)
    } else {
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn into_chat_response(response: CompletionResponse) -> Result<ChatResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    let tool_calls = choice.message.tool_calls.unwrap_or_default();

    // Some compatible providers report "stop" even when tool calls are present.
    let finish_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
        _ if !tool_calls.is_empty() => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    };

    if finish_reason == FinishReason::ToolCalls && tool_calls.is_empty() {
        return Err(LlmError::InvalidResponse(
            "finish reason is tool_calls but no tool calls were returned".to_string(),
        ));
    }

    Ok(ChatResponse {
        finish_reason,
        content: choice.message.content,
        tool_calls,
        usage: response.usage,
    })
}
