//! Core agent loop implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::{
    ChatMessage, FinishReason, LlmClient, LlmError, OpenAiClient, RetryPolicy, RetryingClient, ToolCall,
};
use crate::notify::notifier_from_config;
use crate::tools::{default_registry, ToolRegistry};

use super::dispatch::{truncate_for_log, ToolDispatcher};
use super::error::AgentError;
use super::prompt::assemble_messages;

/// Per-agent loop settings.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Model identifier sent with every completion request
    pub model: String,

    /// Maximum completion rounds that may request tools
    pub max_rounds: usize,

    /// Dispatch the tools of one round concurrently
    pub parallel_tool_calls: bool,
}

impl AgentOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.default_model.clone(),
            max_rounds: config.max_rounds,
            parallel_tool_calls: config.parallel_tool_calls,
        }
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_rounds: 10,
            parallel_tool_calls: false,
        }
    }
}

/// Loop controller states.
#[derive(Debug)]
enum LoopState {
    AwaitingCompletion,
    DispatchingTools(Vec<ToolCall>),
    Done(String),
}

/// A single entry in the chat execution log.
#[derive(Debug, Clone, Serialize)]
pub struct LoopEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: LoopEventKind,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopEventKind {
    ToolCall,
    ToolResult,
    Response,
}

/// Result of a completed chat.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Final assistant answer
    pub content: String,

    /// Full transcript, starting with the system message and ending with the answer
    pub transcript: Vec<ChatMessage>,

    /// Number of tool-call rounds the model used
    pub rounds: usize,

    pub log: Vec<LoopEvent>,
}

/// Drives the tool-calling conversation loop.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    options: AgentOptions,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, options: AgentOptions) -> Self {
        let dispatcher = ToolDispatcher::new(tools.clone()).parallel(options.parallel_tool_calls);
        Self {
            llm,
            tools,
            dispatcher,
            options,
        }
    }

    /// Build an agent talking to the configured OpenAI-compatible endpoint,
    /// with the contact tools registered.
    ///
    /// With `max_attempts > 1` the client is wrapped in a [`RetryingClient`];
    /// the loop itself still never retries.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let openai = OpenAiClient::new(config.api_key.clone(), &config.base_url, config.request_timeout())?;
        let llm: Arc<dyn LlmClient> = if config.max_attempts > 1 {
            let policy = RetryPolicy {
                max_attempts: config.max_attempts,
                ..RetryPolicy::default()
            };
            Arc::new(RetryingClient::new(openai, policy))
        } else {
            Arc::new(openai)
        };
        let notifier = notifier_from_config(config.pushover.as_ref())?;
        let tools = default_registry(notifier)?;

        Ok(Self::new(llm, Arc::new(tools), AgentOptions::from_config(config)))
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `message` given the prior `history`.
    pub async fn chat(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome, AgentError> {
        let messages = assemble_messages(system_prompt, history, message);
        self.run(messages, cancel).await
    }

    /// Run the loop over an already assembled message list until the model
    /// stops requesting tools.
    pub async fn run(
        &self,
        mut transcript: Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome, AgentError> {
        let tool_schemas = self.tools.get_tool_schemas();
        let tools = (!tool_schemas.is_empty()).then_some(tool_schemas.as_slice());

        let mut log = Vec::new();
        let mut rounds = 0;
        let mut state = LoopState::AwaitingCompletion;

        loop {
            state = match state {
                LoopState::AwaitingCompletion => {
                    if rounds >= self.options.max_rounds {
                        tracing::warn!(
                            "Tool-call budget of {} rounds exhausted without a final answer",
                            self.options.max_rounds
                        );
                        return Err(AgentError::LoopBudgetExceeded {
                            max_rounds: self.options.max_rounds,
                            transcript,
                        });
                    }

                    tracing::debug!("Agent round {}", rounds + 1);

                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled { transcript }),
                        response = self.llm.chat_completion(&self.options.model, &transcript, tools) => response?,
                    };

                    match response.finish_reason {
                        FinishReason::Stop => {
                            let content = response
                                .content
                                .filter(|c| !c.trim().is_empty())
                                .ok_or(LlmError::EmptyResponse)?;

                            log.push(event(LoopEventKind::Response, truncate_for_log(&content, 2000)));
                            transcript.push(ChatMessage::assistant(content.clone()));
                            LoopState::Done(content)
                        }
                        FinishReason::ToolCalls => {
                            if response.tool_calls.is_empty() {
                                return Err(LlmError::InvalidResponse(
                                    "finish reason is tool_calls but no tool calls were returned".to_string(),
                                )
                                .into());
                            }

                            rounds += 1;
                            transcript.push(ChatMessage::assistant_tool_calls(
                                response.content,
                                response.tool_calls.clone(),
                            ));
                            LoopState::DispatchingTools(response.tool_calls)
                        }
                    }
                }

                LoopState::DispatchingTools(calls) => {
                    for call in &calls {
                        log.push(event(
                            LoopEventKind::ToolCall,
                            format!(
                                "Calling tool: {} with args: {}",
                                call.function.name, call.function.arguments
                            ),
                        ));
                    }

                    let results = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled { transcript }),
                        results = self.dispatcher.dispatch(&calls) => results,
                    };

                    for result in &results {
                        log.push(event(
                            LoopEventKind::ToolResult,
                            truncate_for_log(result.content.as_deref().unwrap_or_default(), 1000),
                        ));
                    }

                    transcript.extend(results);
                    LoopState::AwaitingCompletion
                }

                LoopState::Done(content) => {
                    return Ok(ChatOutcome {
                        content,
                        transcript,
                        rounds,
                        log,
                    });
                }
            };
        }
    }
}

fn event(kind: LoopEventKind, content: String) -> LoopEvent {
    LoopEvent {
        timestamp: Utc::now(),
        kind,
        content,
    }
}
