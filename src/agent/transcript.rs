//! Append-only conversation record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{ChatMessage, Role, ToolCall};

/// Violations of the tool-call pairing rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Tool message has no tool_call_id")]
    MissingToolCallId,

    #[error("Tool result {0} does not answer a pending tool call")]
    UnexpectedToolResult(String),

    #[error("Tool call {0} was already answered")]
    DuplicateToolResult(String),

    #[error("{0} tool call(s) still awaiting results")]
    PendingToolCalls(usize),

    #[error("Tool call has an empty id")]
    EmptyToolCallId,

    #[error("Tool call has an empty tool name")]
    EmptyToolName,

    #[error("Tool call id {0} appears more than once in one turn")]
    DuplicateToolCallId(String),

    #[error("Tool call id {0} was used by an earlier turn")]
    ReusedToolCallId(String),
}

/// Ordered record of a conversation, replayed to the model on every turn.
///
/// Messages can only be appended. Each append checks that tool results pair
/// up with the calls of the assistant turn right before them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChatMessage>", into = "Vec<ChatMessage>")]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    /// Calls of the latest assistant turn still waiting for a result
    pending: Vec<String>,
    /// Every tool call id ever requested
    seen: HashSet<String>,
}

impl Transcript {
    /// System prompt followed by the user's question.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            ..Self::default()
        }
    }

    /// Transcript holding only the user's question.
    pub fn from_user(user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(user)],
            ..Self::default()
        }
    }

    /// Rebuild a transcript, checking every message in order.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Result<Self, TranscriptError> {
        let mut transcript = Self::default();
        for message in messages {
            transcript.push(message)?;
        }
        Ok(transcript)
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) -> Result<(), TranscriptError> {
        match message.role {
            Role::Tool => {
                let id = message
                    .tool_call_id
                    .as_deref()
                    .ok_or(TranscriptError::MissingToolCallId)?;
                let Some(pos) = self.pending.iter().position(|p| p == id) else {
                    return Err(if self.seen.contains(id) {
                        TranscriptError::DuplicateToolResult(id.to_string())
                    } else {
                        TranscriptError::UnexpectedToolResult(id.to_string())
                    });
                };
                self.pending.remove(pos);
            }
            _ => {
                if !self.pending.is_empty() {
                    return Err(TranscriptError::PendingToolCalls(self.pending.len()));
                }
                if !message.tool_calls.is_empty() {
                    self.check_tool_calls(&message.tool_calls)?;
                    self.pending = message.tool_calls.iter().map(|c| c.id.clone()).collect();
                    self.seen.extend(self.pending.iter().cloned());
                }
            }
        }

        self.messages.push(message);
        Ok(())
    }

    /// Check that a batch of calls could open the next turn.
    pub fn check_tool_calls(&self, calls: &[ToolCall]) -> Result<(), TranscriptError> {
        let mut ids = HashSet::new();
        for call in calls {
            if call.id.is_empty() {
                return Err(TranscriptError::EmptyToolCallId);
            }
            if call.name.is_empty() {
                return Err(TranscriptError::EmptyToolName);
            }
            if !ids.insert(call.id.as_str()) {
                return Err(TranscriptError::DuplicateToolCallId(call.id.clone()));
            }
            if self.seen.contains(&call.id) {
                return Err(TranscriptError::ReusedToolCallId(call.id.clone()));
            }
        }
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Ids of calls from the latest assistant turn that have no result yet.
    pub fn pending_tool_calls(&self) -> &[String] {
        &self.pending
    }

    /// Total number of tool calls requested so far.
    pub fn tool_call_count(&self) -> usize {
        self.seen.len()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

impl TryFrom<Vec<ChatMessage>> for Transcript {
    type Error = TranscriptError;

    fn try_from(messages: Vec<ChatMessage>) -> Result<Self, Self::Error> {
        Self::from_messages(messages)
    }
}

impl From<Transcript> for Vec<ChatMessage> {
    fn from(transcript: Transcript) -> Self {
        transcript.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "search", json!({"query": "x"}))
    }

    #[test]
    fn pairs_results_with_pending_calls() {
        let mut t = Transcript::new("sys", "question");
        t.push(ChatMessage::assistant_with_tool_calls("", vec![call("a"), call("b")]))
            .unwrap();
        assert_eq!(t.pending_tool_calls(), ["a", "b"]);

        // Results may arrive in any order.
        t.push(ChatMessage::tool_result("b", "2")).unwrap();
        t.push(ChatMessage::tool_result("a", "1")).unwrap();
        assert!(t.pending_tool_calls().is_empty());

        t.push(ChatMessage::assistant("done")).unwrap();
        assert_eq!(t.len(), 6);
        assert_eq!(t.tool_call_count(), 2);
    }

    #[test]
    fn rejects_unpaired_and_repeated_results() {
        let mut t = Transcript::from_user("q");
        assert_eq!(
            t.push(ChatMessage::tool_result("a", "1")),
            Err(TranscriptError::UnexpectedToolResult("a".to_string()))
        );

        t.push(ChatMessage::assistant_with_tool_calls("", vec![call("a")]))
            .unwrap();
        t.push(ChatMessage::tool_result("a", "1")).unwrap();
        assert_eq!(
            t.push(ChatMessage::tool_result("a", "1")),
            Err(TranscriptError::DuplicateToolResult("a".to_string()))
        );

        let mut orphan = ChatMessage::tool_result("x", "1");
        orphan.tool_call_id = None;
        assert_eq!(t.push(orphan), Err(TranscriptError::MissingToolCallId));
    }

    #[test]
    fn blocks_new_turns_while_calls_are_pending() {
        let mut t = Transcript::from_user("q");
        t.push(ChatMessage::assistant_with_tool_calls("", vec![call("a")]))
            .unwrap();
        assert_eq!(
            t.push(ChatMessage::assistant("answer")),
            Err(TranscriptError::PendingToolCalls(1))
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn validates_call_ids() {
        let mut t = Transcript::from_user("q");
        assert_eq!(
            t.check_tool_calls(&[call("a"), call("a")]),
            Err(TranscriptError::DuplicateToolCallId("a".to_string()))
        );
        assert_eq!(
            t.check_tool_calls(&[call("")]),
            Err(TranscriptError::EmptyToolCallId)
        );

        t.push(ChatMessage::assistant_with_tool_calls("", vec![call("a")]))
            .unwrap();
        t.push(ChatMessage::tool_result("a", "1")).unwrap();
        assert_eq!(
            t.check_tool_calls(&[call("a")]),
            Err(TranscriptError::ReusedToolCallId("a".to_string()))
        );
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let mut t = Transcript::new("sys", "q");
        t.push(ChatMessage::assistant_with_tool_calls("", vec![call("a")]))
            .unwrap();
        t.push(ChatMessage::tool_result("a", "1")).unwrap();

        let json = serde_json::to_value(&t).unwrap();
        assert!(json.is_array());
        let back: Transcript = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);

        let broken = json!([{"role": "tool", "content": "1", "tool_call_id": "zzz"}]);
        assert!(serde_json::from_value::<Transcript>(broken).is_err());
    }
}
