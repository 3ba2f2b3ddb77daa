//! Contact tools: record interested visitors and unanswered questions.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::notify::Notifier;

/// Record a visitor who wants to get in touch.
pub struct RecordUserDetails {
    notifier: Arc<dyn Notifier>,
}

impl RecordUserDetails {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

/// Non-blank string argument, if present.
fn text_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl Tool for RecordUserDetails {
    fn name(&self) -> &str {
        "record_user_details"
    }

    fn description(&self) -> &str {
        "Use this tool to record that a user is interested in being in touch and provided an email address or mobile number"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "The email address of this user"
                },
                "mobile_number": {
                    "type": "string",
                    "description": "The mobile number of this user"
                },
                "name": {
                    "type": "string",
                    "description": "The user's name, if they provided it"
                },
                "notes": {
                    "type": "string",
                    "description": "Any additional information about the conversation that's worth recording to give context"
                }
            },
            "required": [],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let email = text_arg(&args, "email");
        let mobile = text_arg(&args, "mobile_number");

        if email.is_none() && mobile.is_none() {
            return Ok(json!({"error": "Either email or mobile_number is required"}));
        }

        let name = text_arg(&args, "name").unwrap_or("Name not provided");
        let notes = text_arg(&args, "notes").unwrap_or("not provided");

        tracing::info!("Recording user details for {}", name);
        self.notifier
            .notify(&format!(
                "Recording {} with email {}, mobile number {} and notes {}",
                name,
                email.unwrap_or("Email not provided"),
                mobile.unwrap_or("Number not provided"),
                notes
            ))
            .await?;

        Ok(json!({"recorded": "ok"}))
    }
}

/// Record a question the persona could not answer.
pub struct RecordUnknownQuestion {
    notifier: Arc<dyn Notifier>,
}

impl RecordUnknownQuestion {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Tool for RecordUnknownQuestion {
    fn name(&self) -> &str {
        "record_unknown_question"
    }

    fn description(&self) -> &str {
        "Always use this tool to record any question that couldn't be answered as you didn't know the answer"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question that couldn't be answered"
                }
            },
            "required": ["question"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let question = text_arg(&args, "question")
            .ok_or_else(|| anyhow::anyhow!("Missing 'question' argument"))?;

        tracing::info!("Recording unknown question");
        self.notifier
            .notify(&format!("Recording {} asked that I couldn't answer", question))
            .await?;

        Ok(json!({"recorded": "ok"}))
    }
}
