//! Core agent loop implementation.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{AgentConfig, ToolExecution};
use crate::llm::{ChatMessage, GatewayError, LlmClient, ToolCall};
use crate::tools::{ToolError, ToolRegistry};

use super::events::{AgentEvent, EventHandler, LogEntryType, RunLogEntry};
use super::policy::{AbortReason, Observation, TerminationPolicy};
use super::prompt::build_system_prompt;
use super::{AgentRun, AgentRunResult, Transcript, TranscriptError};

const LOG_CALL_LEN: usize = 1000;
const LOG_RESPONSE_LEN: usize = 2000;

/// A tool-calling agent.
///
/// The registry is shared read-only, so one registry can back many
/// concurrent runs. Each run owns its transcript.
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    on_event: Option<EventHandler>,
    cancel: CancellationToken,
}

impl Agent {
    /// Create a new agent.
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            llm,
            tools,
            on_event: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe tool calls and other progress as the run executes.
    pub fn with_event_handler(mut self, handler: impl Fn(&AgentEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(handler));
        self
    }

    /// Stop runs at the next iteration boundary once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer a single question, with the registered tools listed in the
    /// system prompt.
    pub async fn ask(&self, instructions: &str, question: &str) -> AgentRun {
        let system_prompt = build_system_prompt(instructions, &self.tools);
        self.run(Transcript::new(system_prompt, question)).await
    }

    /// Drive the loop from `transcript` until an answer or an abort.
    pub async fn run(&self, transcript: Transcript) -> AgentRun {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("agent_run", %run_id);
        self.run_loop(transcript).instrument(span).await
    }

    async fn run_loop(&self, mut transcript: Transcript) -> AgentRun {
        let mut log = Vec::new();
        let mut iterations = 0;
        let mut policy = TerminationPolicy::new(&self.config);

        // Get tool schemas for LLM
        let tool_schemas = self.tools.get_tool_schemas();

        // Unanswered calls would be replayed to the model as-is
        let pending = transcript.pending_tool_calls().len();
        let result = if pending > 0 {
            AgentRunResult::Failed(TranscriptError::PendingToolCalls(pending).into())
        } else {
            loop {
                if let Some(reason) = policy.check_boundary(iterations, &self.cancel) {
                    break AgentRunResult::Aborted(reason);
                }

                iterations += 1;
                tracing::debug!("Agent iteration {}", iterations);
                self.emit(AgentEvent::IterationStarted {
                    iteration: iterations,
                });

                // Call LLM
                let response = match self
                    .llm
                    .chat_completion(transcript.messages(), &tool_schemas)
                    .await
                {
                    Ok(response) => response,
                    Err(e) => break AgentRunResult::Failed(e.into()),
                };

                // Tool calls take precedence over any text sent alongside them
                if !response.tool_calls.is_empty() {
                    let calls = response.tool_calls;
                    if let Err(e) = transcript.check_tool_calls(&calls) {
                        break AgentRunResult::Failed(
                            GatewayError::MalformedResponse(e.to_string()).into(),
                        );
                    }

                    let assistant =
                        ChatMessage::assistant_with_tool_calls(response.content.unwrap_or_default(), calls.clone());
                    if let Err(e) = transcript.push(assistant) {
                        break AgentRunResult::Failed(e.into());
                    }

                    let outcomes = self.execute_tool_calls(&calls, &mut log).await;

                    let mut turn = Vec::with_capacity(calls.len());
                    let mut append_error = None;
                    for (call, outcome) in calls.iter().zip(outcomes) {
                        let output = match outcome {
                            Ok(output) => output,
                            Err(e) => format!("Error: {}", e),
                        };
                        if let Err(e) = transcript.push(ChatMessage::tool_result(&call.id, output.clone())) {
                            append_error = Some(e);
                            break;
                        }
                        turn.push(Observation {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                            output,
                        });
                    }
                    if let Some(e) = append_error {
                        break AgentRunResult::Failed(e.into());
                    }

                    if let Some(reason) = policy.record_turn(turn) {
                        break AgentRunResult::Aborted(reason);
                    }
                    continue;
                }

                // No tool calls - this is the final response
                match response.content.filter(|c| !c.trim().is_empty()) {
                    Some(text) => {
                        if let Err(e) = transcript.push(ChatMessage::assistant(text.clone())) {
                            break AgentRunResult::Failed(e.into());
                        }
                        log.push(RunLogEntry::new(LogEntryType::Response, &text, LOG_RESPONSE_LEN));
                        break AgentRunResult::Answer(text);
                    }
                    None => break AgentRunResult::Aborted(AbortReason::EmptyResponse),
                }
            }
        };

        match &result {
            AgentRunResult::Answer(_) => {
                tracing::info!(iterations, "Agent produced final answer");
            }
            AgentRunResult::Aborted(reason) => {
                tracing::warn!(iterations, %reason, "Agent run aborted");
                log.push(RunLogEntry::new(LogEntryType::Error, &reason.to_string(), LOG_CALL_LEN));
            }
            AgentRunResult::Failed(error) => {
                tracing::warn!(iterations, %error, "Agent run failed");
                log.push(RunLogEntry::new(LogEntryType::Error, &error.to_string(), LOG_CALL_LEN));
            }
        }
        self.emit(AgentEvent::Finished {
            result: result.clone(),
        });

        AgentRun {
            result,
            transcript,
            iterations,
            log,
        }
    }

    /// Execute one turn's tool calls. Outcomes come back in request order.
    async fn execute_tool_calls(
        &self,
        calls: &[ToolCall],
        log: &mut Vec<RunLogEntry>,
    ) -> Vec<Result<String, ToolError>> {
        match self.config.tool_execution {
            ToolExecution::Sequential => {
                let mut outcomes = Vec::with_capacity(calls.len());
                for call in calls {
                    self.observe_call(call, log);
                    let outcome = self.tools.execute(&call.name, call.arguments.clone()).await;
                    self.observe_result(call, &outcome, log);
                    outcomes.push(outcome);
                }
                outcomes
            }
            ToolExecution::Concurrent => {
                for call in calls {
                    self.observe_call(call, log);
                }
                let outcomes = join_all(
                    calls
                        .iter()
                        .map(|call| self.tools.execute(&call.name, call.arguments.clone())),
                )
                .await;
                for (call, outcome) in calls.iter().zip(&outcomes) {
                    self.observe_result(call, outcome, log);
                }
                outcomes
            }
        }
    }

    fn observe_call(&self, call: &ToolCall, log: &mut Vec<RunLogEntry>) {
        tracing::info!(tool = %call.name, id = %call.id, "Calling tool");
        log.push(RunLogEntry::new(
            LogEntryType::ToolCall,
            &format!("Calling tool: {} with args: {}", call.name, call.arguments),
            LOG_CALL_LEN,
        ));
        self.emit(AgentEvent::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });
    }

    fn observe_result(
        &self,
        call: &ToolCall,
        outcome: &Result<String, ToolError>,
        log: &mut Vec<RunLogEntry>,
    ) {
        let (output, is_error) = match outcome {
            Ok(output) => (output.clone(), false),
            Err(e) => {
                tracing::warn!(tool = %call.name, id = %call.id, "Tool call failed: {}", e);
                (format!("Error: {}", e), true)
            }
        };
        log.push(RunLogEntry::new(LogEntryType::ToolResult, &output, LOG_CALL_LEN));
        self.emit(AgentEvent::ToolResult {
            id: call.id.clone(),
            name: call.name.clone(),
            output,
            is_error,
        });
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }
}

