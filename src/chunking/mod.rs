//! Text chunking for breaking extracted documents into searchable segments.
//!
//! Documents are cut with a sliding character window (see [`window`]); every
//! window becomes a [`Chunk`] whose ordinal is its position in the document.

mod window;

pub use window::{chunk_document, chunk_text};

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};

/// A chunk of text from a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Document this chunk was cut from.
    pub source_doc_id: String,
    /// Window index in generation order.
    pub ordinal: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(text: impl Into<String>, source_doc_id: impl Into<String>, ordinal: usize) -> Self {
        Self {
            text: text.into(),
            source_doc_id: source_doc_id.into(),
            ordinal,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Single-line preview of at most `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.text.trim().replace('\n', " ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Sliding-window parameters, all measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Window width.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Windows shorter than this are dropped (see [`ChunkingConfig::effective_min_chars`]).
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_chars: 200,
        }
    }
}

impl ChunkingConfig {
    /// Create a config with the default minimum chunk length.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            ..Self::default()
        }
    }

    /// Set the minimum chunk length.
    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Check `chunk_size > 0` and `overlap < chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TutorError::InvalidInput(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(TutorError::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between consecutive window starts.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Minimum length actually enforced: the configured minimum, capped at the
    /// stride so that a trailing window holding a full stride of text survives.
    pub fn effective_min_chars(&self) -> usize {
        self.min_chunk_chars.min(self.stride())
    }
}
