//! Budget and termination checks.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;

/// Why a run stopped without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    MaxIterations,
    EmptyResponse,
    Stalled,
    Cancelled,
    TimeBudgetExhausted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AbortReason::MaxIterations => "max iterations reached",
            AbortReason::EmptyResponse => "empty response",
            AbortReason::Stalled => "repeated no-progress tool call",
            AbortReason::Cancelled => "cancelled",
            AbortReason::TimeBudgetExhausted => "time budget exhausted",
        };
        f.write_str(text)
    }
}

/// One executed call and what it returned.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observation {
    pub name: String,
    pub arguments: Value,
    pub output: String,
}

/// Decides, between iterations, whether the run may continue.
pub(crate) struct TerminationPolicy {
    max_iterations: usize,
    time_budget: Option<Duration>,
    detect_stalls: bool,
    started: Instant,
    previous_turn: Option<Vec<Observation>>,
}

impl TerminationPolicy {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            time_budget: config.time_budget,
            detect_stalls: config.detect_stalls,
            started: Instant::now(),
            previous_turn: None,
        }
    }

    /// Checked before every model call. `completed` is the number of model
    /// calls made so far.
    pub fn check_boundary(&self, completed: usize, cancel: &CancellationToken) -> Option<AbortReason> {
        if cancel.is_cancelled() {
            return Some(AbortReason::Cancelled);
        }
        if let Some(budget) = self.time_budget {
            if self.started.elapsed() >= budget {
                return Some(AbortReason::TimeBudgetExhausted);
            }
        }
        if completed >= self.max_iterations {
            return Some(AbortReason::MaxIterations);
        }
        None
    }

    /// Record a finished tool turn. Reports a stall when it matches the
    /// previous turn call for call, result for result.
    pub fn record_turn(&mut self, turn: Vec<Observation>) -> Option<AbortReason> {
        if !self.detect_stalls {
            return None;
        }
        let stalled = self.previous_turn.as_ref() == Some(&turn);
        self.previous_turn = Some(turn);
        stalled.then_some(AbortReason::Stalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(output: &str) -> Observation {
        Observation {
            name: "search".to_string(),
            arguments: json!({"query": "x"}),
            output: output.to_string(),
        }
    }

    #[test]
    fn reason_text() {
        assert_eq!(AbortReason::MaxIterations.to_string(), "max iterations reached");
        assert_eq!(AbortReason::Stalled.to_string(), "repeated no-progress tool call");
    }

    #[test]
    fn iteration_budget() {
        let policy = TerminationPolicy::new(&AgentConfig::new(2));
        let cancel = CancellationToken::new();
        assert_eq!(policy.check_boundary(0, &cancel), None);
        assert_eq!(policy.check_boundary(1, &cancel), None);
        assert_eq!(policy.check_boundary(2, &cancel), Some(AbortReason::MaxIterations));
    }

    #[test]
    fn cancellation_wins_over_other_limits() {
        let policy = TerminationPolicy::new(&AgentConfig::new(0).with_time_budget(Duration::ZERO));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(policy.check_boundary(0, &cancel), Some(AbortReason::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn time_budget() {
        let policy = TerminationPolicy::new(&AgentConfig::new(10).with_time_budget(Duration::from_secs(5)));
        let cancel = CancellationToken::new();
        assert_eq!(policy.check_boundary(1, &cancel), None);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(
            policy.check_boundary(1, &cancel),
            Some(AbortReason::TimeBudgetExhausted)
        );
    }

    #[test]
    fn stall_needs_identical_consecutive_turns() {
        let mut policy = TerminationPolicy::new(&AgentConfig::new(10).with_stall_detection(true));
        assert_eq!(policy.record_turn(vec![observation("none")]), None);
        assert_eq!(policy.record_turn(vec![observation("one hit")]), None);
        assert_eq!(
            policy.record_turn(vec![observation("one hit")]),
            Some(AbortReason::Stalled)
        );
    }

    #[test]
    fn stall_detection_is_opt_in() {
        let mut policy = TerminationPolicy::new(&AgentConfig::new(10));
        assert_eq!(policy.record_turn(vec![observation("a")]), None);
        assert_eq!(policy.record_turn(vec![observation("a")]), None);
    }
}
