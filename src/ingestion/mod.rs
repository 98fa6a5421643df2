//! Ingestion pipeline: markdown documents on disk become chunked, embedded,
//! citation-ready index entries.
//!
//! One call to [`IngestionPipeline::run`] is one pass over the corpus. There
//! is no persisted in-progress state: a crash mid-run leaves fully ingested
//! documents in the index and the rest are simply retried on the next pass,
//! since chunk identities are a deterministic function of file name and
//! chunk index. Documents are processed independently; a malformed or
//! unreadable document is logged and skipped without aborting the run.

pub mod tracker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::chunking::{self, ChunkParams};
use crate::embeddings::Embedder;
use crate::hashing;
use crate::metadata;
use crate::stores::{ChunkPayload, DistanceMetric, IndexEntry, VectorIndex};
use crate::types::RagError;

pub use tracker::FingerprintTracker;

/// File extension the document walk accepts.
const DOC_EXTENSION: &str = "md";

/// Aggregate counters for one ingestion run.
#[derive(Clone, Debug, Default)]
pub struct IngestReport {
    pub documents_seen: usize,
    pub documents_skipped: usize,
    pub chunks_processed: usize,
    pub chunks_added: usize,
    pub chunks_updated: usize,
    pub duration: Duration,
}

impl IngestReport {
    /// Wall-clock duration of the run in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

enum DocumentOutcome {
    Skipped(&'static str),
    Ingested { chunks: usize, updated: bool },
}

/// Composes the hasher, chunker, metadata extractor, embedder, and vector
/// index into one ingestion pass over a markdown corpus.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    docs_root: PathBuf,
    chunk: ChunkParams,
    tracker: Option<FingerprintTracker>,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        docs_root: impl Into<PathBuf>,
        chunk: ChunkParams,
    ) -> Self {
        Self {
            embedder,
            index,
            docs_root: docs_root.into(),
            chunk,
            tracker: None,
        }
    }

    /// Attaches a fingerprint ledger, enabling unchanged-document skipping
    /// and added/updated accounting. Without one, every upsert counts as
    /// added and no document is skipped for being unchanged.
    #[must_use]
    pub fn with_tracker(mut self, tracker: FingerprintTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Runs one ingestion pass over the corpus.
    ///
    /// Ensures the collection exists, enumerates `*.md` files under the
    /// configured root, and processes each document independently. With
    /// `force_reindex` set, documents are re-embedded even when their content
    /// fingerprint is unchanged.
    ///
    /// Concurrent runs against the same collection are not serializable;
    /// callers wanting a consistent index must serialize ingestion triggers
    /// externally.
    pub async fn run(&self, force_reindex: bool) -> Result<IngestReport, RagError> {
        let started = Instant::now();

        self.index
            .ensure_collection(self.embedder.dimensions(), DistanceMetric::Cosine)
            .await?;

        let documents = discover_documents(&self.docs_root)?;
        info!(
            count = documents.len(),
            root = %self.docs_root.display(),
            "found markdown documents"
        );

        let mut report = IngestReport::default();

        for path in documents {
            report.documents_seen += 1;
            match self.ingest_document(&path, force_reindex).await {
                Ok(DocumentOutcome::Skipped(reason)) => {
                    report.documents_skipped += 1;
                    debug!(path = %path.display(), reason, "skipped document");
                }
                Ok(DocumentOutcome::Ingested { chunks, updated }) => {
                    report.chunks_processed += chunks;
                    if updated {
                        report.chunks_updated += chunks;
                    } else {
                        report.chunks_added += chunks;
                    }
                    info!(path = %path.display(), chunks, "ingested document");
                }
                Err(err) => {
                    error!(
                        path = %path.display(),
                        error = %err,
                        "document ingestion failed; continuing with remaining corpus"
                    );
                }
            }
        }

        report.duration = started.elapsed();
        info!(
            documents = report.documents_seen,
            skipped = report.documents_skipped,
            chunks = report.chunks_processed,
            seconds = report.duration_seconds(),
            "ingestion run complete"
        );
        Ok(report)
    }

    async fn ingest_document(
        &self,
        path: &Path,
        force_reindex: bool,
    ) -> Result<DocumentOutcome, RagError> {
        let text = fs::read_to_string(path).await?;
        if text.trim().is_empty() {
            return Ok(DocumentOutcome::Skipped("empty document"));
        }

        let meta = metadata::extract(&self.docs_root, path, &text);

        let document_fingerprint = hashing::fingerprint(&text);
        let mut previously_seen = false;
        if let Some(tracker) = &self.tracker {
            match tracker.get(&meta.relative_path).await {
                Some(prior) if prior == document_fingerprint && !force_reindex => {
                    return Ok(DocumentOutcome::Skipped("content unchanged"));
                }
                Some(_) => previously_seen = true,
                None => {}
            }
        }

        let chunks = chunking::chunk_text(&text, &self.chunk);
        if chunks.is_empty() {
            return Ok(DocumentOutcome::Skipped("no chunks produced"));
        }

        let vectors = self.embedder.embed_documents(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "embedded {} of {} chunks for {}",
                vectors.len(),
                chunks.len(),
                meta.relative_path
            )));
        }

        let total_chunks = chunks.len();
        let now = Utc::now();
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(idx, (text, vector))| {
                let chunk_id = format!("{}_chunk_{}", meta.file_name, idx);
                let content_hash = hashing::fingerprint(&text);
                let payload = ChunkPayload {
                    chunk_id: chunk_id.clone(),
                    text,
                    chunk_index: idx,
                    total_chunks,
                    file_path: meta.relative_path.clone(),
                    chapter: meta.chapter.clone(),
                    file_name: meta.file_name.clone(),
                    content_hash,
                    citation: meta.chapter.clone(),
                    last_updated: now,
                };
                IndexEntry {
                    id: chunk_id,
                    vector,
                    payload,
                }
            })
            .collect();

        self.index.upsert(entries).await?;

        if let Some(tracker) = &self.tracker {
            tracker.record(&meta.relative_path, &document_fingerprint).await?;
        }

        Ok(DocumentOutcome::Ingested {
            chunks: total_chunks,
            updated: previously_seen,
        })
    }
}

/// Recursively enumerates `*.md` files under `root`, sorted for a
/// deterministic processing order.
fn discover_documents(root: &Path) -> Result<Vec<PathBuf>, RagError> {
    if !root.is_dir() {
        return Err(RagError::Io(format!(
            "document root {} is not a readable directory",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| RagError::Io(err.to_string()))?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == DOC_EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}
