//! Query-time retrieval of document context.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{MemoryIndex, SearchResult};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Finds the chunks of the loaded document most relevant to a query.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<MemoryIndex>>,
    top_k: usize,
    threshold: Option<f32>,
}

impl Retriever {
    /// Create a retriever with no document loaded.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: None,
            top_k: 3,
            threshold: None,
        }
    }

    /// Search the given index.
    pub fn with_index(mut self, index: Option<Arc<MemoryIndex>>) -> Self {
        self.index = index;
        self
    }

    /// Set the maximum number of chunks returned.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Only return chunks scoring strictly above `threshold`.
    pub fn with_threshold(mut self, threshold: Option<f32>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Ranked chunks for a query.
    ///
    /// Empty when no document is loaded or nothing clears the threshold;
    /// callers treat that as insufficient grounding.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let index = match &self.index {
            Some(index) if !index.is_empty() && self.top_k > 0 => index,
            _ => {
                debug!("Nothing to search");
                return Ok(Vec::new());
            }
        };

        index.check_model(self.embedder.model())?;

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.search_with_threshold(&query_embedding, self.top_k, self.threshold)?;

        debug!("Retrieved {} chunks from {}", results.len(), index.doc_id());
        Ok(results)
    }

    /// Chunk texts for a query, best first.
    pub async fn retrieve_texts(&self, query: &str) -> Result<Vec<String>> {
        Ok(self
            .retrieve(query)
            .await?
            .into_iter()
            .map(|r| r.chunk.text)
            .collect())
    }
}

/// Join context chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[String]) -> String {
    chunks.join("\n\n")
}
