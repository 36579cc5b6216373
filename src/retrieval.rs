//! Retrieval provider contract.
//!
//! A retriever answers a query with ranked snippets that carry their source.
//! The agent never talks to a retriever directly; it is exposed to the model
//! through [`crate::tools::SearchDocuments`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document held by an in-memory retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Text content
    pub content: String,

    /// Where the text came from (file name, URL, ...)
    pub source: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// A ranked retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    pub content: String,
    pub source: String,

    /// Relevance in `0.0..=1.0`, higher is better
    pub score: f32,
}

/// Something that can answer similarity queries.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `k` snippets, best first.
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<Snippet>>;
}

/// Scores documents by the share of query terms they contain.
#[derive(Debug, Clone, Default)]
pub struct KeywordRetriever {
    documents: Vec<Document>,
}

impl KeywordRetriever {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn add(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<Snippet>> {
        let terms = tokenize(query);
        if terms.is_empty() {
            anyhow::bail!("Query has no searchable terms");
        }

        let mut hits: Vec<Snippet> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let words = tokenize(&doc.content);
                let matched = terms.iter().filter(|t| words.contains(t)).count();
                (matched > 0).then(|| Snippet {
                    content: doc.content.clone(),
                    source: doc.source.clone(),
                    score: matched as f32 / terms.len() as f32,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    terms.sort_unstable();
    terms.dedup();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> KeywordRetriever {
        KeywordRetriever::new(vec![
            Document::new(
                "LangChain is a framework for building applications with large language models.",
                "intro.md",
            ),
            Document::new(
                "RAG stands for Retrieval-Augmented Generation, combining search with LLM generation.",
                "rag.md",
            ),
            Document::new(
                "Vector stores help with semantic search by storing document embeddings.",
                "vectors.md",
            ),
        ])
    }

    #[tokio::test]
    async fn ranks_by_term_overlap() {
        let hits = corpus().retrieve("RAG search", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "rag.md");
        assert_eq!(hits[1].source, "vectors.md");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn respects_k_and_drops_misses() {
        let hits = corpus().retrieve("search", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "rag.md");

        let hits = corpus().retrieve("kubernetes", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_an_error() {
        assert!(corpus().retrieve("  ?! ", 3).await.is_err());
    }
}
