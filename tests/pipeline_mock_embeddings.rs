//! End-to-end pipeline tests with deterministic embeddings.
//!
//! These exercise ingestion and retrieval against the in-memory index and
//! hash-seeded embedder, suitable for CI and deterministic runs.

use std::path::Path;
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use bookrag::chunking::ChunkParams;
use bookrag::embeddings::HashEmbedder;
use bookrag::ingestion::{FingerprintTracker, IngestionPipeline};
use bookrag::metadata::UNKNOWN_CHAPTER;
use bookrag::retrieval::{NO_CONTENT_FALLBACK, RetrievalPipeline};
use bookrag::stores::{DistanceMetric, InMemoryIndex, VectorIndex};

const DIMENSIONS: usize = 8;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter("info")
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn long_guide_text() -> String {
    let mut text = String::from("# Deployment Guide\n\n");
    for i in 0..40 {
        text.push_str(&format!(
            "Step {i} configures the service and verifies the rollout works. "
        ));
    }
    text
}

fn write_corpus(root: &Path) {
    std::fs::create_dir_all(root.join("nested")).unwrap();
    std::fs::write(
        root.join("intro.md"),
        "# Introduction\n\nThis book explains the retrieval pipeline end to end.\n",
    )
    .unwrap();
    std::fs::write(root.join("nested/guide.md"), long_guide_text()).unwrap();
    std::fs::write(root.join("empty.md"), "   \n\t  \n").unwrap();
    std::fs::write(
        root.join("plain.md"),
        "Prose without any heading, but enough text to form a chunk.\n",
    )
    .unwrap();
    // Not part of the corpus: wrong extension.
    std::fs::write(root.join("notes.txt"), "ignored").unwrap();
}

fn make_pipeline(
    corpus: &TempDir,
    index: Arc<InMemoryIndex>,
) -> IngestionPipeline {
    IngestionPipeline::new(
        Arc::new(HashEmbedder::new(DIMENSIONS)),
        index,
        corpus.path(),
        ChunkParams::default(),
    )
}

#[tokio::test]
async fn ingest_populates_index_with_citation_payloads() {
    init_tracing();
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let index = Arc::new(InMemoryIndex::new());

    let report = make_pipeline(&corpus, index.clone()).run(false).await.unwrap();

    assert_eq!(report.documents_seen, 4);
    assert_eq!(report.documents_skipped, 1, "whitespace-only document skipped");
    assert!(report.chunks_processed > 0);
    assert_eq!(report.chunks_added, report.chunks_processed);
    assert_eq!(report.chunks_updated, 0);
    assert_eq!(index.len(), report.chunks_processed);

    let intro = index.get("intro.md_chunk_0").unwrap();
    assert_eq!(intro.payload.chapter, "Introduction");
    assert_eq!(intro.payload.citation, "Introduction");
    assert_eq!(intro.payload.file_path, "intro.md");
    assert_eq!(intro.payload.chunk_index, 0);
    assert_eq!(intro.payload.total_chunks, 1);
    assert_eq!(intro.vector.len(), DIMENSIONS);

    let guide = index.get("guide.md_chunk_0").unwrap();
    assert_eq!(guide.payload.file_path, "nested/guide.md");
    assert!(guide.payload.total_chunks > 1, "long document spans chunks");

    let plain = index.get("plain.md_chunk_0").unwrap();
    assert_eq!(plain.payload.chapter, UNKNOWN_CHAPTER);
}

#[tokio::test]
async fn whitespace_document_yields_no_entries() {
    let corpus = tempdir().unwrap();
    std::fs::write(corpus.path().join("empty.md"), " \n \t ").unwrap();
    let index = Arc::new(InMemoryIndex::new());

    let report = make_pipeline(&corpus, index.clone()).run(false).await.unwrap();

    assert_eq!(report.documents_seen, 1);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(report.chunks_processed, 0);
    assert!(index.is_empty());
}

#[tokio::test]
async fn reingesting_unchanged_corpus_is_idempotent() {
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let index = Arc::new(InMemoryIndex::new());
    let pipeline = make_pipeline(&corpus, index.clone());

    let first = pipeline.run(false).await.unwrap();
    let before = index.len();
    let intro_hash = index.get("intro.md_chunk_0").unwrap().payload.content_hash;

    let second = pipeline.run(false).await.unwrap();

    assert_eq!(index.len(), before, "same chunk identities, overwritten in place");
    assert_eq!(first.chunks_processed, second.chunks_processed);
    assert_eq!(
        index.get("intro.md_chunk_0").unwrap().payload.content_hash,
        intro_hash
    );
}

#[tokio::test]
async fn tracker_skips_unchanged_documents_and_counts_updates() {
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let state = tempdir().unwrap();
    let index = Arc::new(InMemoryIndex::new());

    let tracker = FingerprintTracker::new(state.path().join("fingerprints.json"));
    tracker.load().await.unwrap();
    let pipeline = make_pipeline(&corpus, index.clone()).with_tracker(tracker);

    let first = pipeline.run(false).await.unwrap();
    assert!(first.chunks_added > 0);
    assert_eq!(first.chunks_updated, 0);

    let second = pipeline.run(false).await.unwrap();
    assert_eq!(second.chunks_processed, 0, "unchanged corpus fully skipped");
    assert_eq!(second.documents_skipped, second.documents_seen);

    std::fs::write(
        corpus.path().join("intro.md"),
        "# Introduction\n\nThis chapter was rewritten since the last pass.\n",
    )
    .unwrap();

    let third = pipeline.run(false).await.unwrap();
    assert_eq!(third.chunks_added, 0);
    assert!(third.chunks_updated > 0, "changed document counts as updated");

    let forced = pipeline.run(true).await.unwrap();
    assert!(
        forced.chunks_processed >= third.chunks_updated,
        "force_reindex re-embeds unchanged documents too"
    );
}

#[tokio::test]
async fn retrieval_returns_ranked_contexts_with_provenance() {
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let index = Arc::new(InMemoryIndex::new());
    make_pipeline(&corpus, index.clone()).run(false).await.unwrap();

    let embedder = Arc::new(HashEmbedder::new(DIMENSIONS));
    let retrieval = RetrievalPipeline::new(embedder, index.clone());

    // The hash embedder maps identical text to identical vectors, so querying
    // with a stored chunk's exact text must rank that chunk first.
    let target = index.get("intro.md_chunk_0").unwrap().payload.text;
    let contexts = retrieval.retrieve(&target, 3).await.unwrap();

    assert!(!contexts.is_empty());
    assert!(contexts.len() <= 3);
    assert_eq!(contexts[0].chunk_id, "intro.md_chunk_0");
    assert_eq!(contexts[0].citation, "Introduction");
    assert_eq!(contexts[0].file_path, "intro.md");
    for pair in contexts.windows(2) {
        assert!(pair[0].score >= pair[1].score, "non-increasing scores");
    }
}

#[tokio::test]
async fn empty_collection_query_yields_fallback_answer() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .ensure_collection(DIMENSIONS, DistanceMetric::Cosine)
        .await
        .unwrap();

    let retrieval = RetrievalPipeline::new(Arc::new(HashEmbedder::new(DIMENSIONS)), index);

    let contexts = retrieval.retrieve("anything at all", 5).await.unwrap();
    assert!(contexts.is_empty());

    let outcome = retrieval
        .answer("anything at all", 5, Some("session-1".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome.answer, NO_CONTENT_FALLBACK);
    assert!(outcome.citations.is_empty());
    assert_eq!(outcome.session_id, "session-1");

    let anonymous = retrieval.answer("anything at all", 5, None).await.unwrap();
    assert!(!anonymous.session_id.is_empty());
}

#[tokio::test]
async fn answer_cites_every_retrieved_context() {
    let corpus = tempdir().unwrap();
    write_corpus(corpus.path());
    let index = Arc::new(InMemoryIndex::new());
    make_pipeline(&corpus, index.clone()).run(false).await.unwrap();

    let retrieval = RetrievalPipeline::new(Arc::new(HashEmbedder::new(DIMENSIONS)), index);
    let outcome = retrieval
        .answer("how do I configure the rollout", 5, None)
        .await
        .unwrap();

    assert!(outcome.answer.contains("Sources:"));
    assert!(!outcome.citations.is_empty());
    for citation in &outcome.citations {
        assert!(citation.text.chars().count() <= 200);
        assert!(!citation.chunk_id.is_empty());
    }
}
