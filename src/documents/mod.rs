//! Document text extraction and the on-disk document library.

mod library;
mod pdf;

pub use library::{CachingExtractor, DocumentLibrary};
pub use pdf::PdfExtractor;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Descriptive metadata of an extracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Stable identifier, the file stem for files on disk.
    pub doc_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
    pub source_path: Option<String>,
    /// State of the source file when it was extracted.
    #[serde(default)]
    pub source_fingerprint: Option<SourceFingerprint>,
}

/// Size and modification time of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFingerprint {
    /// Fingerprint of a file on disk, or `None` if it cannot be read.
    pub async fn of(path: &Path) -> Option<Self> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        Some(Self {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Text of one page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

/// A document's text, page by page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub metadata: DocumentMetadata,
    pub pages: Vec<Page>,
}

impl ExtractedDocument {
    /// Build a single-page document from text already in memory.
    pub fn from_text(doc_id: &str, text: &str) -> Self {
        Self {
            metadata: DocumentMetadata {
                doc_id: doc_id.to_string(),
                title: None,
                author: None,
                page_count: 1,
                source_path: None,
                source_fingerprint: None,
            },
            pages: vec![Page {
                page_number: 1,
                text: text.to_string(),
            }],
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.metadata.doc_id
    }

    /// All page texts joined by newlines.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Trait for turning a file into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract a file. Every failure is a `DocumentRead` error.
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument>;
}

/// Document id for a file: its stem, or "document" when it has none.
pub fn doc_id_for_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}
