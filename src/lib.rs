//! # React Agent
//!
//! A reason/act/observe loop for tool-calling language models.
//!
//! This library provides:
//! - A tool registry with argument validation
//! - An append-only transcript that enforces tool-call pairing
//! - An agent loop with iteration, time and stall budgets
//! - Retrieval exposed to the model as an ordinary tool
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Send the transcript and the tool declarations to the model gateway
//! 2. Execute any tool calls the model asks for
//! 3. Append the results to the transcript as observations
//! 4. Repeat until the model answers or a budget runs out
//!
//! Tool failures are reported back to the model so it can correct itself.
//! Gateway failures end the run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use react_agent::{agent::Agent, tools::ToolRegistry, AgentConfig};
//!
//! let agent = Agent::new(AgentConfig::new(10), gateway, Arc::new(ToolRegistry::with_defaults()));
//! let run = agent.ask("You are a math helper.", "What is 25*17?").await;
//! println!("{:?}", run.result);
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod retrieval;
pub mod tools;

pub use agent::{Agent, AgentRun, AgentRunResult};
pub use config::AgentConfig;
