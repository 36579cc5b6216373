//! Agent loop configuration.
//!
//! Budgets are always explicit. Build an [`AgentConfig`] in code, or load one
//! from environment variables:
//! - `AGENT_MAX_ITERATIONS` - Required. Maximum reason/act iterations per run.
//! - `AGENT_TIME_BUDGET_SECS` - Optional. Wall-clock budget per run, checked between iterations.
//! - `AGENT_PARALLEL_TOOLS` - Optional. Run one turn's tool calls concurrently. Defaults to `false`.
//! - `AGENT_DETECT_STALLS` - Optional. Abort when a turn repeats the previous one exactly. Defaults to `false`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// How the tool calls of a single turn are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolExecution {
    /// One after another, in request order
    #[default]
    Sequential,
    /// All at once; results are still recorded in request order
    Concurrent,
}

/// Agent loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Maximum model calls per run
    pub max_iterations: usize,

    /// Optional wall-clock budget per run
    pub time_budget: Option<Duration>,

    /// Tool execution mode within one turn
    pub tool_execution: ToolExecution,

    /// Abort when a turn repeats the previous turn's calls and results
    pub detect_stalls: bool,
}

impl AgentConfig {
    /// Create a config with the given iteration budget and no other limits.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            time_budget: None,
            tool_execution: ToolExecution::Sequential,
            detect_stalls: false,
        }
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_tool_execution(mut self, mode: ToolExecution) -> Self {
        self.tool_execution = mode;
        self
    }

    pub fn with_stall_detection(mut self, enabled: bool) -> Self {
        self.detect_stalls = enabled;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `AGENT_MAX_ITERATIONS` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_iterations = lookup("AGENT_MAX_ITERATIONS")
            .ok_or_else(|| ConfigError::MissingEnvVar("AGENT_MAX_ITERATIONS".to_string()))?
            .trim()
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("AGENT_MAX_ITERATIONS".to_string(), format!("{}", e))
            })?;

        let time_budget = lookup("AGENT_TIME_BUDGET_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidValue("AGENT_TIME_BUDGET_SECS".to_string(), format!("{}", e))
                })
            })
            .transpose()?;

        let parallel = lookup("AGENT_PARALLEL_TOOLS")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("AGENT_PARALLEL_TOOLS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        let detect_stalls = lookup("AGENT_DETECT_STALLS")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("AGENT_DETECT_STALLS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            max_iterations,
            time_budget,
            tool_execution: if parallel {
                ToolExecution::Concurrent
            } else {
                ToolExecution::Sequential
            },
            detect_stalls,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AgentConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn max_iterations_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "AGENT_MAX_ITERATIONS"));
    }

    #[test]
    fn loads_all_fields() {
        let config = load(&[
            ("AGENT_MAX_ITERATIONS", "8"),
            ("AGENT_TIME_BUDGET_SECS", "30"),
            ("AGENT_PARALLEL_TOOLS", "yes"),
            ("AGENT_DETECT_STALLS", "on"),
        ])
        .unwrap();

        assert_eq!(
            config,
            AgentConfig::new(8)
                .with_time_budget(Duration::from_secs(30))
                .with_tool_execution(ToolExecution::Concurrent)
                .with_stall_detection(true)
        );
    }

    #[test]
    fn optional_fields_default_off() {
        let config = load(&[("AGENT_MAX_ITERATIONS", "3")]).unwrap();
        assert_eq!(config, AgentConfig::new(3));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = load(&[("AGENT_MAX_ITERATIONS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "AGENT_MAX_ITERATIONS"));

        let err = load(&[("AGENT_MAX_ITERATIONS", "3"), ("AGENT_PARALLEL_TOOLS", "maybe")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for AGENT_PARALLEL_TOOLS: expected boolean-like value, got: maybe"
        );
    }
}
