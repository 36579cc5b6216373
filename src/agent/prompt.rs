//! System prompt and chat prompt templates.

use std::collections::HashMap;

use thiserror::Error;

use super::Transcript;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("No value for template variable '{0}'")]
    MissingVariable(String),

    #[error("Unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),
}

/// Build the system prompt with tool descriptions.
pub fn build_system_prompt(instructions: &str, tools: &ToolRegistry) -> String {
    if tools.is_empty() {
        return instructions.to_string();
    }

    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{instructions}

## Available Tools
{tool_descriptions}

## Rules
1. Use a tool whenever it can answer part of the question more reliably than you can
2. If a tool returns an error, read it and correct your next call
3. When you have enough information, answer directly without calling tools"#,
        instructions = instructions,
        tool_descriptions = tool_descriptions
    )
}

/// A system/human prompt pair with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system: String,
    human: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, human: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            human: human.into(),
        }
    }

    /// Render both templates.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<(String, String), PromptError> {
        Ok((render(&self.system, vars)?, render(&self.human, vars)?))
    }

    /// Render into a fresh transcript (system message, then user message).
    pub fn to_transcript(&self, vars: &HashMap<String, String>) -> Result<Transcript, PromptError> {
        let (system, human) = self.render(vars)?;
        Ok(Transcript::new(system, human))
    }
}

fn render(template: &str, vars: &HashMap<String, String>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            offset += pos + 2;
            continue;
        }

        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            offset += pos + 1;
            continue;
        }

        let close = tail
            .find('}')
            .ok_or(PromptError::UnclosedBrace(offset + pos))?;
        let name = tail[1..close].trim();
        let value = vars
            .get(name)
            .ok_or_else(|| PromptError::MissingVariable(name.to_string()))?;
        out.push_str(value);
        rest = &tail[close + 1..];
        offset += pos + close + 1;
    }

    out.push_str(rest);
    Ok(out)
}
