//! Vector index backends for chunk embeddings.
//!
//! The [`VectorIndex`] trait abstracts the persistent (vector, payload) store
//! so pipeline logic never touches a concrete database:
//!
//! ```text
//!                  ┌───────────────────┐
//!                  │ VectorIndex trait │
//!                  │ (ensure/upsert/   │
//!                  │  search)          │
//!                  └────────┬──────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌──────────────┐
//!       │ QdrantIndex │          │ InMemoryIndex│
//!       │ (REST)      │          │ (tests/local)│
//!       └─────────────┘          └──────────────┘
//! ```
//!
//! Entries are owned exclusively by the index: the ingestion pipeline creates
//! and overwrites them, retrieval only reads, and nothing in this core ever
//! deletes them.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;

/// Distance metric a collection is created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    Cosine,
}

/// Payload stored alongside each vector: everything needed to reconstruct a
/// citation without re-reading the source document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub chunk_id: String,
    pub text: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub file_path: String,
    pub chapter: String,
    pub file_name: String,
    pub content_hash: String,
    pub citation: String,
    pub last_updated: DateTime<Utc>,
}

/// The persisted unit: chunk identity, embedding vector, payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One search result: payload plus similarity score.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub payload: ChunkPayload,
    pub score: f32,
}

/// Persistent store of (vector, payload) pairs, scoped to one collection.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent collection bootstrap: a no-op when the collection already
    /// exists. Existence-check-then-create, not atomic; intended for startup
    /// and ingestion, not contended paths.
    async fn ensure_collection(
        &self,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<(), RagError>;

    /// Inserts or overwrites entries by id. Last writer wins, no merge.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), RagError>;

    /// Nearest-neighbor search returning at most `top_k` hits ordered by
    /// non-increasing similarity.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, RagError>;
}
