//! Tool system for the agent.
//!
//! Tools are registered once, before any conversation starts, into a
//! [`ToolRegistry`]. Registration validates each tool's declaration; after
//! that the registry is only read (shared behind an `Arc`).

mod contact;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::llm::{FunctionSchema, ToolSchema};
use crate::notify::Notifier;

pub use contact::{RecordUnknownQuestion, RecordUserDetails};

/// A capability the model may ask to have invoked.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model refers to the tool by.
    fn name(&self) -> &str;

    /// What the tool does, written for the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool with the model-supplied arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid tool name {0:?}: expected 1-64 characters of [a-zA-Z0-9_-]")]
    InvalidName(String),

    #[error("tool `{0}` has an empty description")]
    MissingDescription(String),

    #[error("tool `{name}` has an invalid parameter schema: {reason}")]
    InvalidSchema { name: String, reason: String },

    #[error("tool `{0}` is already registered")]
    Duplicate(String),
}

/// Model-supplied arguments that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid arguments for tool `{tool}`: {source}")]
pub struct ToolArgumentError {
    pub tool: String,
    #[source]
    pub source: serde_json::Error,
}

/// Validated declaration of a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub required: Vec<String>,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("valid tool name regex"))
}

impl ToolDescriptor {
    /// Validate a declaration.
    ///
    /// The parameter schema must be an object schema; every `required`
    /// entry must name a declared property.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let description = description.into();

        if !name_pattern().is_match(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if description.trim().is_empty() {
            return Err(RegistryError::MissingDescription(name));
        }

        let invalid = |reason: &str| RegistryError::InvalidSchema {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if parameters.get("type").and_then(Value::as_str) != Some("object") {
            return Err(invalid("top-level type must be \"object\""));
        }

        let properties = match parameters.get("properties") {
            None => None,
            Some(Value::Object(props)) => Some(props),
            Some(_) => return Err(invalid("\"properties\" must be an object")),
        };

        let required = match parameters.get("required") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("\"required\" entries must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid("\"required\" must be an array")),
        };

        for field in &required {
            if !properties.is_some_and(|p| p.contains_key(field)) {
                return Err(invalid(&format!("required field `{field}` is not a declared property")));
            }
        }

        Ok(Self {
            name,
            description,
            parameters,
            required,
        })
    }

    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            tool_type: "function",
            function: FunctionSchema {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.parameters.clone(),
            },
        }
    }
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a tool.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        let descriptor =
            ToolDescriptor::new(tool.name(), tool.description(), tool.parameters_schema())?;

        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }

        tracing::debug!("Registered tool {}", descriptor.name);
        self.tools.insert(descriptor.name.clone(), Arc::new(tool));
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Descriptors in registration order.
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Declarations to advertise to the model.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.descriptors.iter().map(ToolDescriptor::to_schema).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Registry with the contact tools every persona chatbot carries.
pub fn default_registry(notifier: Arc<dyn Notifier>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(RecordUserDetails::new(notifier.clone()))?;
    registry.register(RecordUnknownQuestion::new(notifier))?;
    Ok(registry)
}
