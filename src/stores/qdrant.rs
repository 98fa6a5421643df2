//! Remote vector index speaking the Qdrant REST surface.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{ChunkPayload, DistanceMetric, IndexEntry, SearchHit, VectorIndex};
use crate::types::RagError;

/// Collection-scoped client for a Qdrant-compatible vector index service.
///
/// Holds no connection state beyond the shared [`Client`]; construct once at
/// startup and pass by reference or `Arc` for the process lifetime.
#[derive(Clone)]
pub struct QdrantIndex {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    collection: String,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: DistanceMetric,
}

#[derive(Serialize)]
struct UpsertRequest {
    points: Vec<PointStruct>,
}

#[derive(Serialize)]
struct PointStruct {
    id: String,
    vector: Vec<f32>,
    payload: ChunkPayload,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: ChunkPayload,
}

impl QdrantIndex {
    pub fn new(
        client: Client,
        base_url: impl AsRef<str>,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, RagError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|err| RagError::InvalidConfig(format!("invalid vector index url: {err}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
            collection: collection.into(),
        })
    }

    /// Name of the collection this client is scoped to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, path: &str) -> Result<Url, RagError> {
        self.base_url
            .join(path)
            .map_err(|err| RagError::Index(err.to_string()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(
        &self,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<(), RagError> {
        let url = self.endpoint(&format!("collections/{}", self.collection))?;

        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?;

        if response.status().is_success() {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(RagError::Index(format!(
                "collection lookup returned status {}",
                response.status()
            )));
        }

        info!(collection = %self.collection, dimensions, "creating collection");
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimensions,
                distance: metric,
            },
        };
        self.authorized(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?
            .error_for_status()
            .map_err(|err| RagError::Index(err.to_string()))?;
        Ok(())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), RagError> {
        if entries.is_empty() {
            return Ok(());
        }
        let points = entries
            .into_iter()
            .map(|entry| PointStruct {
                id: entry.id,
                vector: entry.vector,
                payload: entry.payload,
            })
            .collect();

        let url = self.endpoint(&format!("collections/{}/points?wait=true", self.collection))?;
        self.authorized(self.client.put(url))
            .json(&UpsertRequest { points })
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?
            .error_for_status()
            .map_err(|err| RagError::Index(err.to_string()))?;
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        let url = self.endpoint(&format!("collections/{}/points/search", self.collection))?;
        let request = SearchRequest {
            vector: query,
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .authorized(self.client.post(url))
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?
            .error_for_status()
            .map_err(|err| RagError::Index(err.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?;

        Ok(body
            .result
            .into_iter()
            .map(|point| SearchHit {
                payload: point.payload,
                score: point.score,
            })
            .collect())
    }
}
