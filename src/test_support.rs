//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolSchema};
use crate::notify::Notifier;
use crate::tools::Tool;

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<ChatResponse, LlmError>>,
    repeat: Option<ChatResponse>,
    requests: Vec<Vec<ChatMessage>>,
    tools_offered: Vec<usize>,
}

/// An [`LlmClient`] that replays canned responses and records every request.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        let client = Self::default();
        client.script.lock().unwrap().responses = responses.into();
        client
    }

    /// Return `response` for every request, forever.
    pub fn repeating(response: ChatResponse) -> Self {
        let client = Self::default();
        client.script.lock().unwrap().repeat = Some(response);
        client
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    /// Message lists sent with each request, in order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Number of tool schemas offered with each request.
    pub fn tools_offered(&self) -> Vec<usize> {
        self.script.lock().unwrap().tools_offered.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(messages.to_vec());
        script.tools_offered.push(tools.map_or(0, |t| t.len()));

        if let Some(next) = script.responses.pop_front() {
            return next;
        }
        script
            .repeat
            .clone()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

/// A [`Notifier`] that keeps every message.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn Notifier> {
        Arc::new(Self::new())
    }

    pub fn into_shared(self) -> Arc<dyn Notifier> {
        Arc::new(self)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Returns `{"echo": <args>}` after an optional delay and counts invocations.
#[derive(Clone)]
pub struct EchoTool {
    name: String,
    delay: Duration,
    invocations: Arc<AtomicUsize>,
}

impl EchoTool {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echo the arguments back"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"echo": args}))
    }
}

/// Always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn description(&self) -> &str {
        "Fails every time"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("backend unavailable"))
    }
}
