//! Gateway that replays a fixed sequence of responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChatMessage, ChatResponse, GatewayError, LlmClient, ToolSchema};

/// Deterministic stand-in for a real model.
///
/// Responses are handed out in order. Once the script runs dry the client
/// either keeps repeating one response (see [`ScriptedClient::repeating`])
/// or fails with a provider error.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<ChatResponse, GatewayError>>>,
    repeat: Option<ChatResponse>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok).collect())
    }

    /// Script that may include gateway failures.
    pub fn from_results(results: Vec<Result<ChatResponse, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same response. Tool call ids get the
    /// 1-based call number appended (`call` becomes `call_1`, `call_2`, ...).
    pub fn repeating(response: ChatResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed `chat_completion` calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Transcripts received so far, one per call.
    pub async fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSchema],
    ) -> Result<ChatResponse, GatewayError> {
        let call_no = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(messages.to_vec());

        if let Some(next) = self.script.lock().await.pop_front() {
            return next;
        }

        match &self.repeat {
            // Real providers mint fresh call ids every turn.
            Some(response) => {
                let mut response = response.clone();
                for call in &mut response.tool_calls {
                    call.id = format!("{}_{}", call.id, call_no);
                }
                Ok(response)
            }
            None => Err(GatewayError::Provider {
                code: 500,
                message: "scripted responses exhausted".to_string(),
            }),
        }
    }
}
