//! In-process vector index for tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{DistanceMetric, IndexEntry, SearchHit, VectorIndex};
use crate::types::RagError;

/// Cosine-similarity index backed by a map.
///
/// Mirrors the remote contract closely enough for pipeline tests: upserts
/// overwrite by id, searches return descending-similarity hits bounded by
/// `top_k`. Nothing is persisted.
#[derive(Default)]
pub struct InMemoryIndex {
    state: RwLock<IndexState>,
}

#[derive(Default)]
struct IndexState {
    dimensions: Option<usize>,
    entries: HashMap<String, IndexEntry>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a stored entry by chunk id.
    pub fn get(&self, id: &str) -> Option<IndexEntry> {
        self.state.read().entries.get(id).cloned()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_collection(
        &self,
        dimensions: usize,
        _metric: DistanceMetric,
    ) -> Result<(), RagError> {
        let mut state = self.state.write();
        if state.dimensions.is_none() {
            state.dimensions = Some(dimensions);
        }
        Ok(())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), RagError> {
        let mut state = self.state.write();
        for entry in entries {
            if let Some(dimensions) = state.dimensions {
                if entry.vector.len() != dimensions {
                    return Err(RagError::Index(format!(
                        "entry {} has dimension {}, collection expects {dimensions}",
                        entry.id,
                        entry.vector.len()
                    )));
                }
            }
            state.entries.insert(entry.id.clone(), entry);
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        let state = self.state.read();
        let mut hits: Vec<SearchHit> = state
            .entries
            .values()
            .map(|entry| SearchHit {
                payload: entry.payload.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
