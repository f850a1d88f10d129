//! Tutoring session: the loaded document, the active answer mode and the
//! conversation history.
//!
//! A session owns everything it needs and shares nothing with other
//! sessions. Mutating operations take `&mut self`, so one session handles
//! one request at a time; callers that share a session across tasks wrap it
//! in a `tokio::sync::Mutex`.

use crate::chunking::{chunk_document, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::documents::{CachingExtractor, DocumentLibrary, DocumentMetadata, ExtractedDocument, PdfExtractor, TextExtractor};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TutorError};
use crate::llm::{OpenAIChat, TokenUsage};
use crate::rag::{AnswerMode, ConversationEntry, Mode, Retriever};
use crate::vector_store::{MemoryIndex, SearchResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A document that has been extracted, chunked and indexed.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub metadata: DocumentMetadata,
    pub index: Arc<MemoryIndex>,
}

impl LoadedDocument {
    pub fn doc_id(&self) -> &str {
        &self.metadata.doc_id
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            doc_id: self.metadata.doc_id.clone(),
            title: self.metadata.title.clone(),
            page_count: self.metadata.page_count,
            chunk_count: self.chunk_count(),
        }
    }
}

/// What callers see of a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub title: Option<String>,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// Outcome of [`TutorSession::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModeChange {
    /// The requested mode was already active; nothing changed.
    AlreadyActive,
    /// The mode changed and the history was emptied.
    Switched { history_cleared: usize },
}

/// Answer to one question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub usage: Option<TokenUsage>,
    pub mode: Mode,
    /// False when no document context backed the answer.
    pub grounded: bool,
    pub sources: Vec<SearchResult>,
}

/// One student's tutoring session.
pub struct TutorSession {
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn TextExtractor>,
    guide: Option<AnswerMode>,
    qa: Option<AnswerMode>,
    chunking: ChunkingConfig,
    top_k: usize,
    threshold: Option<f32>,
    normalize: bool,
    active_mode: Mode,
    document: Option<LoadedDocument>,
    history: Vec<ConversationEntry>,
}

impl TutorSession {
    /// Create a session with no answer modes configured, in guide mode.
    pub fn new(embedder: Arc<dyn Embedder>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            embedder,
            extractor,
            guide: None,
            qa: None,
            chunking: ChunkingConfig::default(),
            top_k: 3,
            threshold: None,
            normalize: true,
            active_mode: Mode::Guide,
            document: None,
            history: Vec::new(),
        }
    }

    /// Build a session from configuration.
    ///
    /// Guide and QA modes are configured only when their provider's API key
    /// is present; switching to an unconfigured mode fails later with
    /// `ModeUnavailable`.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let extractor: Arc<dyn TextExtractor> = Arc::new(CachingExtractor::new(
            Arc::new(PdfExtractor::new()),
            DocumentLibrary::new(settings.documents_dir()),
        ));

        let mut session = Self::new(embedder, extractor)
            .with_chunking(settings.chunking.config())
            .with_retrieval(settings.retrieval.top_k, settings.retrieval.threshold)
            .with_normalize(settings.embedding.normalize);

        if settings.guide.provider.has_api_key() {
            let llm = Arc::new(OpenAIChat::from_settings(&settings.guide.provider)?);
            session = session.with_guide(AnswerMode::guide(
                llm,
                prompts.clone(),
                settings.guide.history_window,
            ));
        } else {
            warn!("{} not set, guide mode unavailable", settings.guide.provider.api_key_env);
        }

        if settings.qa.provider.has_api_key() {
            let llm = Arc::new(OpenAIChat::from_settings(&settings.qa.provider)?);
            session = session.with_qa(AnswerMode::qa(llm, prompts.clone()));
        } else {
            warn!("{} not set, qa mode unavailable", settings.qa.provider.api_key_env);
        }

        Ok(session)
    }

    pub fn with_guide(mut self, mode: AnswerMode) -> Self {
        self.guide = Some(mode);
        self
    }

    pub fn with_qa(mut self, mode: AnswerMode) -> Self {
        self.qa = Some(mode);
        self
    }

    /// Default chunking used when loading documents.
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_retrieval(mut self, top_k: usize, threshold: Option<f32>) -> Self {
        self.top_k = top_k;
        self.threshold = threshold;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn active_mode(&self) -> Mode {
        self.active_mode
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn document_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    /// Default chunking parameters.
    pub fn chunking(&self) -> ChunkingConfig {
        self.chunking
    }

    fn answer_mode(&self, mode: Mode) -> Option<&AnswerMode> {
        match mode {
            Mode::Guide => self.guide.as_ref(),
            Mode::Qa => self.qa.as_ref(),
        }
    }

    /// Switch the active mode, clearing the history.
    ///
    /// QA needs a loaded document. On failure nothing changes.
    pub fn set_mode(&mut self, target: Mode) -> Result<ModeChange> {
        if target == self.active_mode {
            return Ok(ModeChange::AlreadyActive);
        }

        if self.answer_mode(target).is_none() {
            return Err(TutorError::ModeUnavailable(format!(
                "{} mode is not configured",
                target
            )));
        }

        if target == Mode::Qa && self.document.is_none() {
            return Err(TutorError::ModeUnavailable(
                "qa mode needs a loaded document".to_string(),
            ));
        }

        let history_cleared = self.history.len();
        self.history.clear();
        self.active_mode = target;

        info!("Switched to {} mode ({} entries cleared)", target, history_cleared);
        Ok(ModeChange::Switched { history_cleared })
    }

    /// Extract, chunk and index a document file, replacing the loaded one.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load_document(
        &mut self,
        path: &Path,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<DocumentSummary> {
        let config = self.chunking_with(chunk_size, overlap);
        config.validate()?;

        let extracted = self.extractor.extract(path).await?;
        self.ingest(extracted, config).await
    }

    /// Chunk and index text that is already in memory.
    pub async fn load_text(
        &mut self,
        doc_id: &str,
        text: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<DocumentSummary> {
        let config = self.chunking_with(chunk_size, overlap);
        self.ingest(ExtractedDocument::from_text(doc_id, text), config).await
    }

    /// Chunk and index a document extracted elsewhere, e.g. an upload.
    pub async fn load_extracted(
        &mut self,
        extracted: ExtractedDocument,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<DocumentSummary> {
        let config = self.chunking_with(chunk_size, overlap);
        self.ingest(extracted, config).await
    }

    fn chunking_with(&self, chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
            ..self.chunking
        }
    }

    async fn ingest(
        &mut self,
        extracted: ExtractedDocument,
        config: ChunkingConfig,
    ) -> Result<DocumentSummary> {
        let doc_id = extracted.doc_id().to_string();
        let chunks = chunk_document(&doc_id, &extracted.full_text(), &config)?;
        if chunks.is_empty() {
            return Err(TutorError::DocumentRead(format!(
                "{} has too little text to index",
                doc_id
            )));
        }

        let index = MemoryIndex::build(&doc_id, chunks, self.embedder.as_ref(), self.normalize).await?;

        let loaded = LoadedDocument {
            metadata: extracted.metadata,
            index: Arc::new(index),
        };
        let summary = loaded.summary();
        if let Some(previous) = self.document.replace(loaded) {
            info!("Replaced {} with {}", previous.doc_id(), doc_id);
        }
        info!("Loaded {} ({} chunks)", doc_id, summary.chunk_count);
        Ok(summary)
    }

    /// Drop the loaded document. History and mode are kept.
    pub fn unload_document(&mut self) -> Option<DocumentSummary> {
        self.document.take().map(|d| d.summary())
    }

    /// Empty the history. Returns the number of entries removed.
    pub fn clear_history(&mut self) -> usize {
        let cleared = self.history.len();
        self.history.clear();
        cleared
    }

    /// Answer a question in the active mode.
    ///
    /// On success one user and one assistant entry are appended to the
    /// history; on failure the history is unchanged.
    #[instrument(skip(self), fields(mode = %self.active_mode))]
    pub async fn query(&mut self, question: &str) -> Result<QueryResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::InvalidInput("question is empty".to_string()));
        }

        let mode = self.active_mode;
        let answer_mode = self.answer_mode(mode).ok_or_else(|| {
            TutorError::ModeUnavailable(format!("{} mode is not configured", mode))
        })?;

        let retriever = Retriever::new(self.embedder.clone())
            .with_index(self.document.as_ref().map(|d| d.index.clone()))
            .with_top_k(self.top_k)
            .with_threshold(self.threshold);
        // Context is optional in guide mode, so a retrieval failure only
        // costs the excerpts there.
        let sources = match retriever.retrieve(question).await {
            Ok(sources) => sources,
            Err(e) if mode == Mode::Guide => {
                warn!("Answering without document context: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let context: Vec<String> = sources.iter().map(|r| r.chunk.text.clone()).collect();
        let context = (!context.is_empty()).then_some(context.as_slice());

        let response = answer_mode.respond(question, context, &self.history).await?;

        self.history.push(ConversationEntry::user(question, mode));
        self.history.push(ConversationEntry::assistant(response.answer.clone(), mode));

        Ok(QueryResponse {
            answer: response.answer,
            usage: response.usage,
            mode,
            grounded: response.grounded,
            sources: if response.grounded { sources } else { Vec::new() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockChatModel, MockEmbedder};
    use async_trait::async_trait;

    struct NoExtractor;

    #[async_trait]
    impl TextExtractor for NoExtractor {
        async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
            Err(TutorError::DocumentRead(format!("cannot read {}", path.display())))
        }
    }

    fn letters() -> String {
        format!("{}{}", "A".repeat(300), "B".repeat(300))
    }

    fn session_with(
        embedder: Arc<MockEmbedder>,
        guide: Arc<MockChatModel>,
        qa: Arc<MockChatModel>,
    ) -> TutorSession {
        TutorSession::new(embedder, Arc::new(NoExtractor))
            .with_guide(AnswerMode::guide(guide, Prompts::default(), 5))
            .with_qa(AnswerMode::qa(qa, Prompts::default()))
    }

    fn session() -> TutorSession {
        session_with(
            Arc::new(MockEmbedder::new()),
            Arc::new(MockChatModel::new("What do you already know?")),
            Arc::new(MockChatModel::new("It is about A.")),
        )
    }

    #[tokio::test]
    async fn test_load_text_chunks_and_indexes() {
        let mut session = session();
        let summary = session.load_text("letters", &letters(), 200, 50).await.unwrap();

        assert_eq!(summary.chunk_count, 4);
        let doc = session.document().unwrap();
        let chunks: Vec<_> = doc.index.chunks().collect();
        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert_eq!(chunks[0].text, "A".repeat(200));
    }

    #[tokio::test]
    async fn test_qa_without_document_is_unavailable() {
        let mut session = session();

        assert!(matches!(
            session.set_mode(Mode::Qa),
            Err(TutorError::ModeUnavailable(_))
        ));
        assert_eq!(session.active_mode(), Mode::Guide);
    }

    #[tokio::test]
    async fn test_unconfigured_mode_is_unavailable() {
        let mut session = TutorSession::new(Arc::new(MockEmbedder::new()), Arc::new(NoExtractor));
        session.load_text("letters", &letters(), 200, 50).await.unwrap();

        assert!(matches!(
            session.set_mode(Mode::Qa),
            Err(TutorError::ModeUnavailable(_))
        ));
        assert!(matches!(
            session.query("hello").await,
            Err(TutorError::ModeUnavailable(_))
        ));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_guide_queries_append_tagged_entries() {
        let mut session = session();
        session.query("How do I start?").await.unwrap();
        session.query("And then?").await.unwrap();

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "How do I start?");
        assert_eq!(history[2].content, "And then?");
        assert_eq!(history[0].role, crate::rag::EntryRole::User);
        assert_eq!(history[1].role, crate::rag::EntryRole::Assistant);
        assert_eq!(history[3].role, crate::rag::EntryRole::Assistant);
        assert!(history.iter().all(|e| e.mode == Mode::Guide));
    }

    #[tokio::test]
    async fn test_switching_clears_history_and_same_mode_is_noop() {
        let mut session = session();
        session.load_text("letters", &letters(), 200, 50).await.unwrap();
        session.query("warm up").await.unwrap();

        assert_eq!(session.set_mode(Mode::Guide).unwrap(), ModeChange::AlreadyActive);
        assert_eq!(session.history().len(), 2);

        assert_eq!(
            session.set_mode(Mode::Qa).unwrap(),
            ModeChange::Switched { history_cleared: 2 }
        );
        assert!(session.history().is_empty());

        session.query("What letters appear?").await.unwrap();
        assert!(session.history().iter().all(|e| e.mode == Mode::Qa));
    }

    #[tokio::test]
    async fn test_qa_answers_from_retrieved_chunks() {
        let qa = Arc::new(MockChatModel::new("It is about A."));
        let mut session = session_with(
            Arc::new(MockEmbedder::new()),
            Arc::new(MockChatModel::new("hint")),
            qa.clone(),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();
        session.set_mode(Mode::Qa).unwrap();

        let response = session.query("aaa?").await.unwrap();
        assert!(response.grounded);
        assert_eq!(response.mode, Mode::Qa);
        assert_eq!(response.answer, "It is about A.");
        assert_eq!(response.sources.len(), 3);
        assert!(response.sources.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(response.sources[0].chunk.ordinal, 0);
        assert_eq!(qa.calls(), 1);
    }

    #[tokio::test]
    async fn test_qa_after_unload_returns_fallback() {
        let qa = Arc::new(MockChatModel::new("unused"));
        let mut session = session_with(
            Arc::new(MockEmbedder::new()),
            Arc::new(MockChatModel::new("hint")),
            qa.clone(),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();
        session.set_mode(Mode::Qa).unwrap();
        assert!(session.unload_document().is_some());

        let response = session.query("What is A?").await.unwrap();
        assert!(!response.grounded);
        assert_eq!(response.answer, Prompts::default().qa.fallback_answer);
        assert_eq!(qa.calls(), 0);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_query_leaves_history_unchanged() {
        let mut session = session_with(
            Arc::new(MockEmbedder::new()),
            Arc::new(MockChatModel::failing()),
            Arc::new(MockChatModel::new("")),
        );

        assert!(matches!(
            session.query("help").await,
            Err(TutorError::LanguageModel(_))
        ));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_document() {
        let embedder = Arc::new(MockEmbedder::new());
        let mut session = session_with(
            embedder,
            Arc::new(MockChatModel::new("")),
            Arc::new(MockChatModel::new("")),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();

        assert!(matches!(
            session.load_document(Path::new("/missing.pdf"), 200, 50).await,
            Err(TutorError::DocumentRead(_))
        ));
        assert!(matches!(
            session.load_text("tiny", "ab", 200, 50).await,
            Err(TutorError::DocumentRead(_))
        ));
        assert!(matches!(
            session.load_text("bad", &letters(), 100, 100).await,
            Err(TutorError::InvalidInput(_))
        ));
        assert_eq!(session.document().unwrap().doc_id(), "letters");
    }

    #[tokio::test]
    async fn test_embedding_failure_during_load_keeps_previous_document() {
        let embedder = Arc::new(MockEmbedder::new().failing_after_batches(1));
        let mut session = session_with(
            embedder.clone(),
            Arc::new(MockChatModel::new("What do you already know?")),
            Arc::new(MockChatModel::new("It is about A.")),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();
        session.query("What comes first?").await.unwrap();

        let result = session.load_text("replacement", "C".repeat(400).as_str(), 200, 50).await;

        assert!(matches!(result, Err(TutorError::EmbeddingService { .. })));
        assert_eq!(embedder.batch_calls(), 2);
        let doc = session.document().unwrap();
        assert_eq!(doc.doc_id(), "letters");
        assert_eq!(doc.chunk_count(), 4);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].content, "What comes first?");
    }

    #[tokio::test]
    async fn test_guide_query_survives_retrieval_failure() {
        let embedder = Arc::new(MockEmbedder::new().failing_queries());
        let guide = Arc::new(MockChatModel::new("What do you already know?"));
        let mut session = session_with(
            embedder.clone(),
            guide.clone(),
            Arc::new(MockChatModel::new("It is about A.")),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();

        let response = session.query("Where do I start?").await.unwrap();

        assert_eq!(embedder.embed_calls(), 1);
        assert_eq!(guide.calls(), 1);
        assert!(!response.grounded);
        assert!(response.sources.is_empty());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_qa_query_fails_on_retrieval_failure() {
        let qa = Arc::new(MockChatModel::new("It is about A."));
        let mut session = session_with(
            Arc::new(MockEmbedder::new().failing_queries()),
            Arc::new(MockChatModel::new("What do you already know?")),
            qa.clone(),
        );
        session.load_text("letters", &letters(), 200, 50).await.unwrap();
        session.set_mode(Mode::Qa).unwrap();

        assert!(matches!(
            session.query("What is it about?").await,
            Err(TutorError::EmbeddingService { .. })
        ));
        assert_eq!(qa.calls(), 0);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_load_extracted_keeps_metadata() {
        let mut session = session();
        assert!(!session.document_loaded());

        let mut extracted = ExtractedDocument::from_text("upload", &letters());
        extracted.metadata.title = Some("Letters".to_string());
        let summary = session.load_extracted(extracted, 300, 0).await.unwrap();

        assert!(session.document_loaded());
        assert_eq!(summary.title.as_deref(), Some("Letters"));
        assert_eq!(summary.chunk_count, 2);

        assert!(matches!(
            session
                .load_extracted(ExtractedDocument::from_text("bad", "text"), 100, 100)
                .await,
            Err(TutorError::InvalidInput(_))
        ));
        assert_eq!(session.document().unwrap().doc_id(), "upload");
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.query("   ").await,
            Err(TutorError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_history() {
        let mut session = session();
        session.query("one").await.unwrap();
        assert_eq!(session.clear_history(), 2);
        assert!(session.history().is_empty());
        assert_eq!(session.active_mode(), Mode::Guide);
    }
}
