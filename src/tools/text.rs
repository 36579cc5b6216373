//! Text inspection tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Count the characters in a word.
pub struct WordLength;

#[async_trait]
impl Tool for WordLength {
    fn name(&self) -> &str {
        "get_word_length"
    }

    fn description(&self) -> &str {
        "Returns the length of a word."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "word": {
                    "type": "string",
                    "description": "The word to measure"
                }
            },
            "required": ["word"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let word = args["word"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'word' argument"))?;
        Ok(word.chars().count().to_string())
    }
}
