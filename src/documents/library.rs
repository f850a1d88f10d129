//! JSON cache of extracted documents under the data directory.

use super::{doc_id_for_path, DocumentMetadata, ExtractedDocument, SourceFingerprint, TextExtractor};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory of extracted documents, one `<doc_id>.json` file each.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    dir: PathBuf,
}

impl DocumentLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", doc_id))
    }

    /// Store a document, replacing any previous extraction with the same id.
    pub fn save(&self, document: &ExtractedDocument) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(document.doc_id());
        let json = serde_json::to_string_pretty(document)?;
        std::fs::write(&path, json)?;
        debug!("Saved {} to {}", document.doc_id(), path.display());
        Ok(path)
    }

    /// Load a stored document, if present.
    pub fn load(&self, doc_id: &str) -> Result<Option<ExtractedDocument>> {
        let path = self.path_for(doc_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Metadata of every stored document, sorted by id.
    ///
    /// Unreadable entries are skipped with a warning.
    pub fn list(&self) -> Result<Vec<DocumentMetadata>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(TutorError::from)
                .and_then(|c| {
                    serde_json::from_str::<ExtractedDocument>(&c).map_err(TutorError::from)
                });
            match parsed {
                Ok(doc) => documents.push(doc.metadata),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        Ok(documents)
    }

    /// Remove a stored document. Returns whether it existed.
    pub fn remove(&self, doc_id: &str) -> Result<bool> {
        let path = self.path_for(doc_id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

/// Extractor that reuses library entries extracted from the same file.
///
/// An entry is reused only while the file's size and modification time
/// match those recorded at extraction.
pub struct CachingExtractor {
    inner: Arc<dyn TextExtractor>,
    library: DocumentLibrary,
}

impl CachingExtractor {
    pub fn new(inner: Arc<dyn TextExtractor>, library: DocumentLibrary) -> Self {
        Self { inner, library }
    }
}

#[async_trait]
impl TextExtractor for CachingExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let source = path.display().to_string();
        let fingerprint = SourceFingerprint::of(path).await;

        match self.library.load(&doc_id_for_path(path)) {
            Ok(Some(cached))
                if cached.metadata.source_path.as_deref() == Some(source.as_str())
                    && fingerprint.is_some()
                    && cached.metadata.source_fingerprint == fingerprint =>
            {
                info!("Using cached extraction of {}", cached.doc_id());
                return Ok(cached);
            }
            Ok(Some(_)) => debug!("Cached extraction of {} is stale", source),
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache entry for {}: {}", source, e),
        }

        let mut document = self.inner.extract(path).await?;
        document.metadata.source_fingerprint = fingerprint;
        if let Err(e) = self.library.save(&document) {
            warn!("Failed to cache {}: {}", document.doc_id(), e);
        }
        Ok(document)
    }
}
