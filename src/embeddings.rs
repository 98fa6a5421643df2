//! Embedding providers for document and query vectors.
//!
//! Two embedding modes exist and must not be mixed: stored content is
//! embedded in document mode, search input in query mode. Vectors produced in
//! one mode are only meaningfully comparable against vectors from the other
//! through the index's cosine metric; the split is a contract of the backing
//! model, not something this crate enforces mathematically.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Selects the embedding model's indexing behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingMode {
    Document,
    Query,
}

impl EmbeddingMode {
    /// Wire value understood by the embedding service.
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingMode::Document => "search_document",
            EmbeddingMode::Query => "search_query",
        }
    }
}

/// Maps text to fixed-length dense vectors.
///
/// Failures are surfaced as [`RagError::Embedding`] with the underlying
/// cause; implementations never retry internally.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Output dimension of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embeds stored content in document mode, one vector per input text,
    /// order preserved.
    ///
    /// Callers own batching: the backing service bounds how many texts fit in
    /// one call (see [`CohereEmbedder::MAX_BATCH`]), and a document's chunks
    /// are expected to fit within that bound.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embeds a single search query in query mode.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for a Cohere-compatible `/v1/embed` endpoint.
#[derive(Clone)]
pub struct CohereEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CohereEmbedder {
    /// Default embedding model; its output dimension is [`Self::DIMENSIONS`].
    pub const MODEL: &'static str = "embed-english-v3.0";
    pub const DIMENSIONS: usize = 1024;
    /// Largest batch the embed endpoint accepts in one call.
    pub const MAX_BATCH: usize = 96;
    pub const DEFAULT_BASE_URL: &'static str = "https://api.cohere.ai";

    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: Self::MODEL.to_string(),
        }
    }

    /// Overrides the service endpoint (tests, gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn embed(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let request = EmbedRequest {
            texts,
            model: &self.model,
            input_type: mode.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embed", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?
            .error_for_status()
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        if body.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "requested {} embeddings, service returned {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts, EmbeddingMode::Document).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let texts = [text.to_string()];
        let mut vectors = self.embed(&texts, EmbeddingMode::Query).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("service returned no vector for query".to_string()))
    }
}

/// Deterministic embedder for tests and offline runs.
///
/// Vectors are seeded from a hash of the input text: identical text yields
/// identical vectors and distinct text almost surely differs. The vectors
/// carry no semantic meaning.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimensions)
            .map(|i| {
                let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 24);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.vector_for(text))
    }
}
