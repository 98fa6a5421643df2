//! Fingerprint ledger backing incremental reindexing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;

use crate::types::RagError;

/// Tracks the last ingested fingerprint per document so unchanged documents
/// can be skipped when a run is not forced.
#[derive(Clone, Debug)]
pub struct FingerprintTracker {
    path: PathBuf,
    state: Arc<Mutex<HashMap<String, String>>>,
}

impl FingerprintTracker {
    /// Creates a tracker that persists its ledger to the provided path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Path where the ledger is persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads previously persisted fingerprints, if any.
    pub async fn load(&self) -> Result<(), RagError> {
        if !self.path.exists() {
            return Ok(());
        }
        let data = fs::read_to_string(&self.path).await?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&data).map_err(|err| RagError::Io(err.to_string()))?;
        let mut guard = self.state.lock().await;
        *guard = entries;
        Ok(())
    }

    /// Last recorded fingerprint for a document, if it was ever ingested.
    pub async fn get(&self, document: &str) -> Option<String> {
        self.state.lock().await.get(document).cloned()
    }

    /// Records a document's fingerprint and persists the updated ledger.
    pub async fn record(&self, document: &str, fingerprint: &str) -> Result<(), RagError> {
        let mut guard = self.state.lock().await;
        let previous = guard.insert(document.to_string(), fingerprint.to_string());
        if previous.as_deref() == Some(fingerprint) && self.path.exists() {
            return Ok(());
        }
        let serialized =
            serde_json::to_string(&*guard).map_err(|err| RagError::Io(err.to_string()))?;
        drop(guard);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, serialized).await?;
        Ok(())
    }
}
