//! Tool dispatch: turn tool-call requests into correlated tool messages.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};

use crate::llm::{ChatMessage, ToolCall};
use crate::tools::{ToolArgumentError, ToolRegistry};

/// Executes tool-call requests against a read-only registry.
///
/// Every request yields exactly one tool message carrying the request's id,
/// and the returned messages are in request order. Nothing a tool or the
/// model does makes dispatch fail: unknown tools answer `{}` and argument
/// or execution failures answer `{"error": ...}`.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    parallel: bool,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            parallel: false,
        }
    }

    /// Run the tools of one round concurrently instead of one at a time.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<ChatMessage> {
        if self.parallel && calls.len() > 1 {
            // join_all yields outputs in input order
            join_all(calls.iter().map(|call| self.dispatch_one(call))).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.dispatch_one(call).await);
            }
            results
        }
    }

    async fn dispatch_one(&self, call: &ToolCall) -> ChatMessage {
        let name = call.function.name.as_str();

        let Some(tool) = self.registry.get(name) else {
            tracing::warn!(tool = name, call_id = %call.id, "Model requested unknown tool, answering with {{}}");
            return ChatMessage::tool(&call.id, "{}");
        };

        let args = match parse_arguments(call) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(call_id = %call.id, "{}", e);
                return ChatMessage::tool(&call.id, error_content(&e.to_string()));
            }
        };

        tracing::info!(tool = name, call_id = %call.id, "Calling tool with args: {}", args);

        let content = match tool.execute(args).await {
            Ok(result) => result.to_string(),
            Err(e) => {
                tracing::warn!(tool = name, call_id = %call.id, "Tool failed: {:#}", e);
                error_content(&format!("{:#}", e))
            }
        };

        tracing::debug!(tool = name, call_id = %call.id, "Tool result: {}", truncate_for_log(&content, 500));
        ChatMessage::tool(&call.id, content)
    }
}

/// Parse the raw argument text. Blank arguments mean "no arguments".
pub fn parse_arguments(call: &ToolCall) -> Result<Value, ToolArgumentError> {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|source| ToolArgumentError {
        tool: call.function.name.clone(),
        source,
    })
}

fn error_content(message: &str) -> String {
    json!({ "error": message }).to_string()
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
