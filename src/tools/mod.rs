//! Tool system for the agent.
//!
//! Tools are the actions the model can take. Each tool declares a name, a
//! description the model reads to decide relevance, and a JSON schema for
//! its arguments. The registry validates arguments against that schema
//! before the handler runs.

mod math;
mod schema;
mod search;
mod text;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolSchema;

pub use math::{Add, Calculator, Multiply};
pub use schema::validate_arguments;
pub use search::SearchDocuments;
pub use text::WordLength;

/// Errors reported back to the model as tool observations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool {tool} failed: {message}")]
    HandlerFailure { tool: String, message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateToolName(String),
}

/// Information about a tool for display purposes.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the tool description.
    fn description(&self) -> &str;

    /// Get the JSON schema for parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Registry of available tools, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the arithmetic and text tools.
    pub fn with_defaults() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(Add),
            Arc::new(Multiply),
            Arc::new(Calculator),
            Arc::new(WordLength),
        ];
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();
        Self { tools, index }
    }

    /// Add a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateToolName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// All tools in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Declarations for the model gateway, in registration order.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve, validate and run a tool.
    ///
    /// Handler errors and panics both come back as
    /// [`ToolError::HandlerFailure`].
    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self.resolve(name)?;

        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };

        validate_arguments(name, &tool.parameters_schema(), &args)?;

        match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ToolError::HandlerFailure {
                tool: name.to_string(),
                message: e.to_string(),
            }),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                tracing::error!(tool = %name, "Tool handler panicked: {}", message);
                Err(ToolError::HandlerFailure {
                    tool: name.to_string(),
                    message,
                })
            }
        }
    }
}
