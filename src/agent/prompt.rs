//! System prompt and per-turn message assembly.

use std::path::{Path, PathBuf};

use super::error::AgentError;
use crate::config::{Config, ConfigError};
use crate::llm::{ChatMessage, Role};

/// Context describing the person the chatbot speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub summary: String,
    /// Profile text (e.g. an exported LinkedIn profile). May be empty.
    pub profile: String,
}

impl Persona {
    /// Load `summary.txt` (required) and `linkedin.txt` (optional) from `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, ConfigError> {
        let summary = read_context(dir.join("summary.txt"))?;

        let profile_path = dir.join("linkedin.txt");
        let profile = if profile_path.exists() {
            read_context(profile_path)?
        } else {
            tracing::debug!("No profile at {}, continuing with summary only", profile_path.display());
            String::new()
        };

        Ok(Self {
            name: name.to_string(),
            summary,
            profile,
        })
    }

    pub fn system_prompt(&self) -> String {
        let name = &self.name;
        let mut prompt = format!(
            "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, \
even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; \
ask for their email and record it using your record_user_details tool."
        );

        prompt.push_str(&format!("\n\n## Summary:\n{}\n", self.summary.trim_end()));
        if !self.profile.trim().is_empty() {
            prompt.push_str(&format!("\n## LinkedIn Profile:\n{}\n", self.profile.trim_end()));
        }
        prompt.push_str(&format!(
            "\nWith this context, please chat with the user, always staying in character as {name}."
        ));
        prompt
    }
}

/// Load the configured persona and render its system prompt.
pub fn persona_system_prompt(config: &Config) -> Result<String, AgentError> {
    let persona = Persona::load(&config.persona_dir, &config.persona_name)?;
    Ok(persona.system_prompt())
}

fn read_context(path: PathBuf) -> Result<String, ConfigError> {
    std::fs::read_to_string(&path).map_err(|source| ConfigError::ContextFile { path, source })
}

/// Build the message list for one turn: `[system] + history + [user]`.
///
/// System entries in `history` are dropped so the transcript starts with
/// exactly one system message.
pub fn assemble_messages(system_prompt: &str, history: &[ChatMessage], user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
    messages.push(ChatMessage::user(user_text));
    messages
}
