//! PDF extraction with lopdf.

use super::{doc_id_for_path, DocumentMetadata, ExtractedDocument, Page, TextExtractor};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use lopdf::{Document, Object};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Extracts the text layer of PDF files, page by page.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    inline_space: Regex,
    blank_lines: Regex,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor {
    pub fn new() -> Self {
        let inline_space = Regex::new(r"[ \t\u{a0}]+").expect("Invalid regex");
        let blank_lines = Regex::new(r"\n\s*\n(\s*\n)+").expect("Invalid regex");
        Self {
            inline_space,
            blank_lines,
        }
    }

    /// Collapse runs of spaces and of blank lines left by the text layer.
    fn clean(&self, text: &str) -> String {
        let text = self.inline_space.replace_all(text, " ");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.lines().map(str::trim).collect::<Vec<_>>().join("\n").trim().to_string()
    }

    /// Extract a PDF held in memory, e.g. an upload.
    pub async fn extract_bytes(&self, doc_id: &str, bytes: Vec<u8>) -> Result<ExtractedDocument> {
        let doc_id = doc_id.to_string();
        let cleaner = self.clone();
        tokio::task::spawn_blocking(move || {
            let document = Document::load_mem(&bytes)
                .map_err(|e| TutorError::DocumentRead(format!("Failed to parse PDF: {}", e)))?;
            cleaner.read_document(&document, doc_id, None)
        })
        .await
        .map_err(|e| TutorError::DocumentRead(format!("Extraction task failed: {}", e)))?
    }

    fn read_document(
        &self,
        document: &Document,
        doc_id: String,
        source_path: Option<String>,
    ) -> Result<ExtractedDocument> {
        if document.is_encrypted() {
            return Err(TutorError::DocumentRead(format!("{} is encrypted", doc_id)));
        }

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());
        for number in &page_numbers {
            match document.extract_text(&[*number]) {
                Ok(text) => pages.push(Page {
                    page_number: *number,
                    text: self.clean(&text),
                }),
                Err(e) => {
                    warn!("No text on page {} of {}: {}", number, doc_id, e);
                    pages.push(Page {
                        page_number: *number,
                        text: String::new(),
                    });
                }
            }
        }

        if pages.iter().all(|p| p.text.is_empty()) {
            return Err(TutorError::DocumentRead(format!(
                "{} contains no extractable text (image-based or empty)",
                doc_id
            )));
        }

        debug!("Read {} pages of {}", pages.len(), doc_id);
        Ok(ExtractedDocument {
            metadata: DocumentMetadata {
                doc_id,
                title: info_string(document, b"Title"),
                author: info_string(document, b"Author"),
                page_count: page_numbers.len(),
                source_path,
                source_fingerprint: None,
            },
            pages,
        })
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        if !path.exists() {
            return Err(TutorError::DocumentRead(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let path: PathBuf = path.to_path_buf();
        let cleaner = self.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            let document = Document::load(&path).map_err(|e| {
                TutorError::DocumentRead(format!("Failed to open {}: {}", path.display(), e))
            })?;
            cleaner.read_document(
                &document,
                doc_id_for_path(&path),
                Some(path.display().to_string()),
            )
        })
        .await
        .map_err(|e| TutorError::DocumentRead(format!("Extraction task failed: {}", e)))??;

        info!(
            "Extracted {} pages ({} chars) from {}",
            extracted.metadata.page_count,
            extracted.char_count(),
            extracted.doc_id()
        );
        Ok(extracted)
    }
}

/// A text entry of the trailer's Info dictionary.
fn info_string(document: &Document, key: &[u8]) -> Option<String> {
    let info = match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    match info.as_dict().ok()?.get(key).ok()? {
        Object::String(bytes, _) => {
            let text = decode_pdf_string(bytes);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_pdf_string(b"Caf\xe9"), "Café");
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        let extractor = PdfExtractor::new();
        let raw = "  Chapter\t 1  \n\n\n\n  Limits   and\u{a0}continuity \n";
        assert_eq!(extractor.clean(raw), "Chapter 1\n\nLimits and continuity");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[tokio::test]
    async fn test_missing_file_is_document_read_error() {
        let result = PdfExtractor::new()
            .extract(Path::new("/nonexistent/lecture.pdf"))
            .await;
        assert!(matches!(result, Err(TutorError::DocumentRead(_))));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_document_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let result = PdfExtractor::new().extract(&path).await;
        assert!(matches!(result, Err(TutorError::DocumentRead(_))));

        let result = PdfExtractor::new()
            .extract_bytes("upload", b"nope".to_vec())
            .await;
        assert!(matches!(result, Err(TutorError::DocumentRead(_))));
    }
}
