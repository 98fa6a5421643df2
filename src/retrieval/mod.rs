//! Retrieval pipeline: a user query becomes ranked, citation-bearing
//! contexts and a grounded answer.
//!
//! Retrieval is read-only and safe under unbounded concurrency. No
//! re-ranking, deduplication, or filtering is applied beyond the index's
//! native ordering; an empty result set is a valid outcome, not an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::embeddings::Embedder;
use crate::stores::VectorIndex;
use crate::types::RagError;

/// Characters of chunk text carried into answer bodies and citations.
pub const CITATION_TEXT_LIMIT: usize = 200;

/// Number of top contexts quoted in the assembled answer body.
const ANSWER_CONTEXT_COUNT: usize = 3;

/// Message returned when no relevant content exists for a query.
pub const NO_CONTENT_FALLBACK: &str = "I couldn't find relevant information in the book to \
     answer your question. Please try rephrasing or ask about topics covered in the book.";

/// One ranked supporting passage with provenance. Ephemeral: produced fresh
/// on every query, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub chunk_id: String,
    pub text: String,
    pub citation: String,
    pub score: f32,
    pub chapter: String,
    pub file_path: String,
}

/// Citation emitted to callers; text truncated to [`CITATION_TEXT_LIMIT`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: String,
    pub text: String,
    pub citation: String,
    pub score: f32,
}

/// Human-readable answer plus structured citations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Caller-facing query outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub session_id: String,
}

/// Composes the embedder (query mode) and vector index into per-query
/// context retrieval.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl RetrievalPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embeds `query` in query mode and returns its `top_k` nearest contexts
    /// in non-increasing similarity order.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>, RagError> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(&vector, top_k).await?;
        debug!(count = hits.len(), "retrieved contexts");

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedContext {
                chunk_id: hit.payload.chunk_id,
                text: hit.payload.text,
                citation: hit.payload.citation,
                score: hit.score,
                chapter: hit.payload.chapter,
                file_path: hit.payload.file_path,
            })
            .collect())
    }

    /// Retrieves contexts and assembles the caller-facing outcome.
    ///
    /// A fresh v4 UUID is issued when the caller supplies no session id.
    pub async fn answer(
        &self,
        query: &str,
        top_k: usize,
        session_id: Option<String>,
    ) -> Result<QueryOutcome, RagError> {
        let contexts = self.retrieve(query, top_k).await?;
        let answer = assemble_answer(&contexts);
        Ok(QueryOutcome {
            answer: answer.text,
            citations: answer.citations,
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }
}

/// Builds a readable answer from ranked contexts.
///
/// The answer body quotes the top three context texts (truncated) followed
/// by a Sources section listing their citation labels. Every retrieved
/// context, not just the quoted three, appears in the structured citations.
/// Empty input yields the fallback message with no citations.
pub fn assemble_answer(contexts: &[RetrievedContext]) -> Answer {
    if contexts.is_empty() {
        return Answer {
            text: NO_CONTENT_FALLBACK.to_string(),
            citations: Vec::new(),
        };
    }

    let mut text = String::from("Based on the book content:\n\n");
    for context in contexts.iter().take(ANSWER_CONTEXT_COUNT) {
        text.push_str("- ");
        text.push_str(&truncate_chars(&context.text, CITATION_TEXT_LIMIT));
        text.push_str("...\n\n");
    }
    text.push_str("\nSources:\n");
    for context in contexts.iter().take(ANSWER_CONTEXT_COUNT) {
        text.push_str("- ");
        text.push_str(&context.citation);
        text.push('\n');
    }

    let citations = contexts
        .iter()
        .map(|context| Citation {
            chunk_id: context.chunk_id.clone(),
            text: truncate_chars(&context.text, CITATION_TEXT_LIMIT),
            citation: context.citation.clone(),
            score: context.score,
        })
        .collect();

    Answer { text, citations }
}

/// Fixed character cutoff; no ellipsis or word-boundary awareness.
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(id: &str, text: &str, citation: &str, score: f32) -> RetrievedContext {
        RetrievedContext {
            chunk_id: id.to_string(),
            text: text.to_string(),
            citation: citation.to_string(),
            score,
            chapter: citation.to_string(),
            file_path: "chapter.md".to_string(),
        }
    }

    #[test]
    fn empty_contexts_yield_fallback_answer() {
        let answer = assemble_answer(&[]);
        assert_eq!(answer.text, NO_CONTENT_FALLBACK);
        assert!(answer.citations.is_empty());
    }

    #[test]
    fn answer_quotes_top_three_and_cites_all() {
        let contexts = vec![
            context("a", "first passage", "Chapter One", 0.9),
            context("b", "second passage", "Chapter Two", 0.8),
            context("c", "third passage", "Chapter Three", 0.7),
            context("d", "fourth passage", "Chapter Four", 0.6),
        ];
        let answer = assemble_answer(&contexts);

        assert!(answer.text.starts_with("Based on the book content:"));
        assert!(answer.text.contains("first passage"));
        assert!(answer.text.contains("third passage"));
        assert!(!answer.text.contains("fourth passage"));
        assert!(answer.text.contains("Sources:"));
        assert!(answer.text.contains("- Chapter One"));
        assert!(!answer.text.contains("- Chapter Four"));

        assert_eq!(answer.citations.len(), 4);
        assert_eq!(answer.citations[3].chunk_id, "d");
    }

    #[test]
    fn citation_text_is_truncated_to_limit() {
        let long_text = "x".repeat(CITATION_TEXT_LIMIT * 3);
        let contexts = vec![context("a", &long_text, "Chapter", 0.5)];
        let answer = assemble_answer(&contexts);

        assert_eq!(
            answer.citations[0].text.chars().count(),
            CITATION_TEXT_LIMIT
        );
        // The full text stays on the retrieved context for downstream use.
        assert_eq!(contexts[0].text.chars().count(), CITATION_TEXT_LIMIT * 3);
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let text = "é".repeat(250);
        let truncated = truncate_chars(&text, CITATION_TEXT_LIMIT);
        assert_eq!(truncated.chars().count(), CITATION_TEXT_LIMIT);
    }

    #[test]
    fn short_text_is_not_padded() {
        let truncated = truncate_chars("short", CITATION_TEXT_LIMIT);
        assert_eq!(truncated, "short");
    }
}
