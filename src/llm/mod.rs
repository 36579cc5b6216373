//! Model gateway contract.
//!
//! The gateway receives the whole transcript plus the tool declarations and
//! answers with either a final text or a list of tool calls. Transport,
//! retries and provider selection live behind this trait.

mod scripted;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use scripted::ScriptedClient;
pub use types::{ChatMessage, ChatResponse, Role, ToolCall, ToolSchema};

/// Failures surfaced by a gateway. All of them end the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Model gateway timed out")]
    Timeout,

    #[error("Provider error {code}: {message}")]
    Provider { code: u16, message: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// A chat model that can decide on tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Ask the model for its next step given the transcript so far.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, GatewayError>;
}
