//! Shared error type for the ingestion and retrieval pipelines.

use thiserror::Error;

/// Errors surfaced by the RAG core.
///
/// Transient dependency failures ([`Embedding`](RagError::Embedding),
/// [`Index`](RagError::Index)) carry the underlying cause and are never
/// retried internally; retry and backoff policy belongs to the caller.
/// Configuration problems ([`InvalidConfig`](RagError::InvalidConfig)) are
/// fatal to the run that encounters them.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Http(err.to_string())
    }
}
