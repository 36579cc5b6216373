//! Agent module - the reason/act/observe loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Send the transcript and tool declarations to the model
//! 2. If the model requests tool calls, execute them and append the results
//! 3. Repeat until the model answers or a budget runs out

mod agent_loop;
mod events;
mod policy;
mod prompt;
mod transcript;


use thiserror::Error;

use crate::llm::GatewayError;

pub use agent_loop::Agent;
pub use events::{AgentEvent, EventHandler, LogEntryType, RunLogEntry};
pub use policy::AbortReason;
pub use prompt::{build_system_prompt, PromptError, PromptTemplate};
pub use transcript::{Transcript, TranscriptError};

/// Errors that end a run as [`AgentRunResult::Failed`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentRunResult {
    /// The model produced a final answer.
    Answer(String),
    /// A budget or protocol guard stopped the run.
    Aborted(AbortReason),
    /// The run could not make progress.
    Failed(RunError),
}

impl AgentRunResult {
    pub fn answer(&self) -> Option<&str> {
        match self {
            AgentRunResult::Answer(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, AgentRunResult::Answer(_))
    }
}

/// Everything a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// How the run ended
    pub result: AgentRunResult,

    /// The full conversation, including what the run appended
    pub transcript: Transcript,

    /// Number of model calls made
    pub iterations: usize,

    /// Detailed execution log
    pub log: Vec<RunLogEntry>,
}
