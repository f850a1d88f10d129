//! Deterministic doubles for the external capabilities.

use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use crate::llm::{ChatMessage, ChatModel, Completion, TokenUsage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embeds text as its lowercase letter histogram (26 dimensions), so texts
/// sharing letters score higher against each other.
pub struct MockEmbedder {
    model: String,
    /// Batches succeeding before every later batch fails.
    batch_budget: Option<usize>,
    fail_queries: bool,
    embed_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::with_model("mock-embedding")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            batch_budget: None,
            fail_queries: false,
            embed_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails as an unreachable service would.
    pub fn failing(self) -> Self {
        self.failing_after_batches(0).failing_queries()
    }

    /// The first `n` batch calls succeed, later ones fail.
    pub fn failing_after_batches(mut self, n: usize) -> Self {
        self.batch_budget = Some(n);
        self
    }

    /// Single-text embedding (queries) fails; batches are unaffected.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; 26];
        for c in text.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(TutorError::embedding(0, "service unreachable"));
        }
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let previous = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.batch_budget.is_some_and(|budget| previous >= budget) {
            return Err(TutorError::embedding(0, "service unreachable"));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        26
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Replies with a fixed text and records every request.
pub struct MockChatModel {
    reply: String,
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as a rate-limited or unreachable provider would.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of the most recent request.
    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(TutorError::LanguageModel("rate limited".to_string()));
        }
        Ok(Completion {
            text: self.reply.clone(),
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }

    fn model(&self) -> &str {
        "mock-chat"
    }
}
