//! Document search tool backed by a retriever.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::retrieval::Retriever;

/// Upper bound on snippets returned in one call.
const MAX_RESULTS: usize = 20;

/// Search a document collection and cite the sources.
pub struct SearchDocuments {
    retriever: Arc<dyn Retriever>,
    default_k: usize,
}

impl SearchDocuments {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            retriever,
            default_k: 4,
        }
    }

    /// Number of snippets returned when the model does not pass `k`.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k.clamp(1, MAX_RESULTS);
        self
    }
}

#[async_trait]
impl Tool for SearchDocuments {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for passages relevant to a query. Returns numbered snippets with their source. Use this when the answer depends on information you have not been given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                },
                "k": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum number of snippets to return (default: 4)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let k = args["k"]
            .as_u64()
            .map(|k| k.clamp(1, MAX_RESULTS as u64) as usize)
            .unwrap_or(self.default_k);

        tracing::debug!(query, k, "Searching documents");
        let snippets = self.retriever.retrieve(query, k).await?;

        if snippets.is_empty() {
            return Ok(format!("No relevant documents found for: {}", query));
        }

        Ok(snippets
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{}] (source: {}) {}", i + 1, s.source, s.content))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{Document, KeywordRetriever};
    use crate::tools::{ToolError, ToolRegistry};

    fn tool() -> SearchDocuments {
        let retriever = KeywordRetriever::new(vec![
            Document::new("RAG combines retrieval with generation.", "rag.md"),
            Document::new("Agents call tools in a loop.", "agents.md"),
        ]);
        SearchDocuments::new(Arc::new(retriever))
    }

    #[tokio::test]
    async fn formats_numbered_citations() {
        let out = tool().execute(json!({"query": "RAG"})).await.unwrap();
        assert_eq!(out, "[1] (source: rag.md) RAG combines retrieval with generation.");
    }

    #[tokio::test]
    async fn k_below_one_is_rejected_by_the_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool())).unwrap();

        let err = registry
            .execute("search", json!({"query": "RAG", "k": -3}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let out = registry
            .execute("search", json!({"query": "RAG", "k": u64::MAX}))
            .await
            .unwrap();
        assert!(out.starts_with("[1] (source: rag.md)"));
    }

    #[tokio::test]
    async fn reports_no_hits() {
        let out = tool().execute(json!({"query": "weather", "k": 2})).await.unwrap();
        assert_eq!(out, "No relevant documents found for: weather");
    }
}
