//! Ingestion and retrieval core for RAG-powered documentation Q&A.
//!
//! ```text
//! Markdown corpus ──► ingestion::IngestionPipeline
//!                       ├─► chunking   (boundary-aware windows)
//!                       ├─► hashing    (content fingerprints)
//!                       ├─► metadata   (chapter / source path)
//!                       ├─► embeddings (document mode)
//!                       └─► stores::VectorIndex (upsert by chunk id)
//!
//! User query ──► retrieval::RetrievalPipeline
//!                  ├─► embeddings (query mode)
//!                  ├─► stores::VectorIndex (top-k cosine search)
//!                  └─► answer assembly (quoted passages + Sources)
//! ```
//!
//! The embedding model and vector database are capability traits
//! ([`Embedder`], [`VectorIndex`]) rather than concrete clients: construct
//! the backing implementations once at startup, hold them for the process
//! lifetime, and inject them into both pipelines. Tests swap in
//! [`HashEmbedder`] and [`InMemoryIndex`] for deterministic runs.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod hashing;
pub mod ingestion;
pub mod metadata;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use chunking::{ChunkParams, chunk_text};
pub use config::RagConfig;
pub use embeddings::{CohereEmbedder, Embedder, EmbeddingMode, HashEmbedder};
pub use ingestion::{FingerprintTracker, IngestReport, IngestionPipeline};
pub use metadata::DocumentMetadata;
pub use retrieval::{
    Answer, Citation, QueryOutcome, RetrievalPipeline, RetrievedContext, assemble_answer,
};
pub use stores::{
    ChunkPayload, DistanceMetric, InMemoryIndex, IndexEntry, QdrantIndex, SearchHit, VectorIndex,
};
pub use types::RagError;
