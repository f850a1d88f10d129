//! In-memory vector index with brute-force search.

use super::{dot_product, l2_normalize, SearchResult};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use tracing::{debug, info, instrument};

/// Read-only index of one document's chunks and their embeddings.
///
/// Entries are kept in chunk order. The index remembers which embedding model
/// and dimension built it and refuses queries that do not match.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    doc_id: String,
    model: String,
    dimensions: usize,
    normalized: bool,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl MemoryIndex {
    /// Embed every chunk and build the index.
    ///
    /// The index only exists once every chunk has been embedded, so a failed
    /// build leaves whatever index the caller already held untouched.
    #[instrument(skip(chunks, embedder), fields(chunks = chunks.len()))]
    pub async fn build(
        doc_id: &str,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        normalize: bool,
    ) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let index = Self::from_embeddings(doc_id, embedder.model(), chunks, embeddings, normalize)?;
        info!(
            "Indexed {} chunks of {} ({} dimensions)",
            index.len(),
            doc_id,
            index.dimensions
        );
        Ok(index)
    }

    /// Build an index from precomputed embeddings, aligned with `chunks`.
    pub fn from_embeddings(
        doc_id: &str,
        model: &str,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        normalize: bool,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(TutorError::embedding(
                embeddings.len().min(chunks.len()),
                format!("{} embeddings for {} chunks", embeddings.len(), chunks.len()),
            ));
        }

        if let Some(stray) = chunks.iter().find(|c| c.source_doc_id != doc_id) {
            return Err(TutorError::InvalidInput(format!(
                "chunk {} belongs to {}, not {}",
                stray.ordinal, stray.source_doc_id, doc_id
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        let mut entries = Vec::with_capacity(chunks.len());
        for (i, (chunk, mut embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            if embedding.len() != dimensions {
                return Err(TutorError::embedding(
                    i,
                    format!("expected {} dimensions, got {}", dimensions, embedding.len()),
                ));
            }
            if normalize {
                l2_normalize(&mut embedding);
            }
            entries.push((chunk, embedding));
        }

        Ok(Self {
            doc_id: doc_id.to_string(),
            model: model.to_string(),
            dimensions,
            normalized: normalize,
            entries,
        })
    }

    /// Rank chunks against a query embedding.
    ///
    /// Results are ordered by descending score, ties by ascending ordinal,
    /// and hold at most `top_k` entries.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query, top_k, None)
    }

    /// Like [`MemoryIndex::search`], keeping only scores strictly above
    /// `threshold` before truncating to `top_k`.
    pub fn search_with_threshold(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(TutorError::EmbeddingMismatch(format!(
                "query has {} dimensions, index {} has {}",
                query.len(),
                self.doc_id,
                self.dimensions
            )));
        }

        let mut query = query.to_vec();
        if self.normalized {
            l2_normalize(&mut query);
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: dot_product(&query, embedding),
            })
            .filter(|r| threshold.map_or(true, |t| r.score > t))
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        results.truncate(top_k);

        debug!("Search over {} returned {} results", self.doc_id, results.len());
        Ok(results)
    }

    /// Fail unless vectors from `model` can be compared with this index.
    pub fn check_model(&self, model: &str) -> Result<()> {
        if model != self.model {
            return Err(TutorError::EmbeddingMismatch(format!(
                "index {} was built with {}, query uses {}",
                self.doc_id, self.model, model
            )));
        }
        Ok(())
    }

    /// Document this index belongs to.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Embedding model that built this index.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Vector length (0 for an empty index).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed chunks in document order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|(chunk, _)| chunk)
    }
}
