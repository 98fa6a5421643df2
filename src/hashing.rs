//! Content fingerprinting for change detection.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the exact byte content of `text`.
///
/// Deterministic: identical text always yields the identical fingerprint.
/// Accepts any input, including the empty string.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
