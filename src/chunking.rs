//! Boundary-aware windowed chunking of document text.
//!
//! The chunker walks the text in fixed-size character windows. Every window
//! except the final one prefers to end at the nearest sentence terminator or
//! newline past the window's halfway mark, so chunks avoid mid-word and
//! mid-sentence cuts where a natural break is available. Consecutive windows
//! share [`ChunkParams::overlap`] characters of raw context; when a boundary
//! shrink occurred the effective overlap varies, which is accepted rather
//! than corrected.

use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Validated chunk window parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChunkParams {
    max_size: usize,
    overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_size: Self::DEFAULT_MAX_SIZE,
            overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

impl ChunkParams {
    pub const DEFAULT_MAX_SIZE: usize = 500;
    pub const DEFAULT_OVERLAP: usize = 50;

    /// Builds parameters, rejecting combinations that cannot make progress.
    ///
    /// `overlap >= max_size` would let a window fail to advance, so it is a
    /// configuration error rather than a value to clamp silently.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, RagError> {
        if max_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunk max_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= max_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk overlap ({overlap}) must be smaller than max_size ({max_size})"
            )));
        }
        Ok(Self { max_size, overlap })
    }

    /// Maximum window size in characters.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Characters of raw context shared between consecutive windows.
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Splits `text` into ordered, overlapping, boundary-aware chunks.
///
/// Each emitted chunk is trimmed of surrounding whitespace; windows that trim
/// to nothing are dropped. Empty text yields an empty sequence, and text
/// shorter than the window size yields a single chunk. The walk is fully
/// deterministic: identical text and parameters produce identical output.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let window_end = start + params.max_size;
        let mut end = window_end.min(len);

        if window_end < len {
            if let Some(break_at) = last_break(&chars[start..end]) {
                // Only shrink when the break sits strictly past the halfway
                // mark; earlier breaks would discard too much of the window.
                if 2 * break_at > params.max_size {
                    end = start + break_at + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        // The final window advances from its unshrunk end so the loop always
        // steps past the text length.
        let advance_from = if window_end < len { end } else { window_end };
        let next = advance_from.saturating_sub(params.overlap);
        // A boundary shrink can pull `end - overlap` back to (or before) the
        // current start; restart at the shrunk end instead of stalling.
        start = if next > start { next } else { advance_from };
    }

    chunks
}

/// Index of the last sentence terminator or newline within `window`.
fn last_break(window: &[char]) -> Option<usize> {
    window.iter().rposition(|&c| c == '.' || c == '\n')
}
