//! Environment-driven configuration for the pipelines.

use std::path::PathBuf;

use crate::chunking::ChunkParams;
use crate::types::RagError;

/// Settings shared by the ingestion and retrieval pipelines.
///
/// Values come from the environment; a `.env` file is honored when present.
///
/// | Variable            | Meaning                         | Default        |
/// |---------------------|---------------------------------|----------------|
/// | `QDRANT_URL`        | vector index endpoint           | required       |
/// | `QDRANT_API_KEY`    | vector index credential         | none           |
/// | `QDRANT_COLLECTION` | collection name                 | `book_content` |
/// | `COHERE_API_KEY`    | embedding service credential    | required       |
/// | `BOOK_DOCS_PATH`    | markdown corpus root            | `../book/docs` |
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub docs_root: PathBuf,
    pub collection: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub cohere_api_key: String,
    pub chunk: ChunkParams,
    pub top_k: usize,
}

impl RagConfig {
    pub const DEFAULT_COLLECTION: &'static str = "book_content";
    pub const DEFAULT_DOCS_ROOT: &'static str = "../book/docs";
    pub const DEFAULT_TOP_K: usize = 5;

    /// Reads configuration from the environment.
    ///
    /// Missing required credentials are configuration errors, fatal to the
    /// run that hits them.
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();

        let docs_root = std::env::var("BOOK_DOCS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_DOCS_ROOT));
        let collection = std::env::var("QDRANT_COLLECTION")
            .unwrap_or_else(|_| Self::DEFAULT_COLLECTION.to_string());
        let qdrant_url = std::env::var("QDRANT_URL")
            .map_err(|_| RagError::InvalidConfig("QDRANT_URL is not set".to_string()))?;
        let qdrant_api_key = std::env::var("QDRANT_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        let cohere_api_key = std::env::var("COHERE_API_KEY")
            .map_err(|_| RagError::InvalidConfig("COHERE_API_KEY is not set".to_string()))?;

        Ok(Self {
            docs_root,
            collection,
            qdrant_url,
            qdrant_api_key,
            cohere_api_key,
            chunk: ChunkParams::default(),
            top_k: Self::DEFAULT_TOP_K,
        })
    }

    #[must_use]
    pub fn with_chunk_params(mut self, chunk: ChunkParams) -> Self {
        self.chunk = chunk;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
