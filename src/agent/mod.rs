//! Agent module - the tool-calling conversation loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Assemble the system prompt, prior history and the new user message
//! 2. Call the LLM with the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a final answer or the round budget runs out

mod agent_loop;
mod dispatch;
mod error;
mod prompt;

pub use agent_loop::{Agent, AgentOptions, ChatOutcome, LoopEvent, LoopEventKind};
pub use dispatch::{parse_arguments, ToolDispatcher};
pub use error::AgentError;
pub use prompt::{assemble_messages, persona_system_prompt, Persona};
