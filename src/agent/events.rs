//! Run events and the per-run execution log.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::AgentRunResult;

/// Progress notifications emitted while a run executes.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// About to ask the model for its next step.
    IterationStarted { iteration: usize },
    /// The model requested a tool call.
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
    },
    /// A tool call finished (successfully or not).
    ToolResult {
        id: String,
        name: String,
        output: String,
        is_error: bool,
    },
    /// The run reached a terminal state.
    Finished { result: AgentRunResult },
}

/// Callback invoked for every [`AgentEvent`].
pub type EventHandler = Arc<dyn Fn(&AgentEvent) + Send + Sync>;

/// A single entry in the run log.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Entry type
    pub entry_type: LogEntryType,

    /// Content of the entry
    pub content: String,
}

/// Types of log entries.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    /// Tool is being called
    ToolCall,
    /// Tool returned a result
    ToolResult,
    /// Agent produced final response
    Response,
    /// Run aborted or failed
    Error,
}

impl RunLogEntry {
    pub(crate) fn new(entry_type: LogEntryType, content: &str, max_len: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            entry_type,
            content: truncate_for_log(content, max_len),
        }
    }
}

/// Truncate a string for logging purposes, on a char boundary.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}... [truncated]", &s[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("héllo wörld", 5), "héllo... [truncated]");
    }

    #[test]
    fn entry_type_serializes_snake_case() {
        let entry = RunLogEntry::new(LogEntryType::ToolResult, "42", 100);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["entry_type"], "tool_result");
        assert_eq!(value["content"], "42");
    }
}
