//! Argument validation against a tool's declared JSON schema.

use serde_json::Value;

use super::ToolError;

/// Check `args` against `schema` for the tool named `tool`.
///
/// Every violation is reported, joined with `; `. A schema that does not
/// compile is the tool's fault and comes back as a handler failure.
pub fn validate_arguments(tool: &str, schema: &Value, args: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::Validator::new(schema).map_err(|e| ToolError::HandlerFailure {
        tool: tool.to_string(),
        message: format!("invalid tool schema: {}", e),
    })?;
    if validator.is_valid(args) {
        return Ok(());
    }
    let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
    Err(ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: errors.join("; "),
    })
}
