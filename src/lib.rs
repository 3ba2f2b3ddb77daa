//! # persona-agent
//!
//! A chatbot that speaks for one person on their website, answering from a
//! summary of their background and calling a small set of tools along the way.
//!
//! This library provides:
//! - A bounded tool-calling conversation loop over an OpenAI-compatible API
//! - A registry of validated tools, plus the contact tools every persona carries
//! - Push notifications for recorded contacts and unanswered questions
//! - An HTTP API for chat front-ends
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Assemble the persona system prompt, prior history and the new message
//! 2. Call the LLM with the declared tools
//! 3. Execute any requested tool calls and feed the results back
//! 4. Repeat until the LLM answers, or fail once the round budget is spent
//!
//! ## Example
//!
//! ```rust,ignore
//! use persona_agent::{agent::{Agent, Persona}, config::Config};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::from_env()?;
//! let persona = Persona::load(&config.persona_dir, &config.persona_name)?;
//! let agent = Agent::from_config(&config)?;
//! let outcome = agent
//!     .chat(&persona.system_prompt(), &[], "What do you work on?", &CancellationToken::new())
//!     .await?;
//! println!("{}", outcome.content);
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod notify;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use config::Config;
