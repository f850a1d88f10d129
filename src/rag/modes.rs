//! Answer modes: Socratic guidance and document-grounded QA.

use super::conversation::{ConversationEntry, Mode};
use super::retriever::format_context_for_prompt;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, TokenUsage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What an answer mode produced for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeResponse {
    pub answer: String,
    pub usage: Option<TokenUsage>,
    /// False when the answer is the fixed fallback rather than model output
    /// built on retrieved context.
    pub grounded: bool,
}

/// Answers grounded only in retrieved document excerpts.
pub struct QaMode {
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
}

/// Socratic tutor that guides instead of solving.
pub struct GuideMode {
    llm: Arc<dyn ChatModel>,
    prompts: Prompts,
    history_window: usize,
}

/// A response strategy, selected per session.
pub enum AnswerMode {
    Qa(QaMode),
    Guide(GuideMode),
}

impl AnswerMode {
    pub fn qa(llm: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        AnswerMode::Qa(QaMode { llm, prompts })
    }

    /// Guide mode sending at most `history_window` prior exchanges.
    pub fn guide(llm: Arc<dyn ChatModel>, prompts: Prompts, history_window: usize) -> Self {
        AnswerMode::Guide(GuideMode {
            llm,
            prompts,
            history_window,
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            AnswerMode::Qa(_) => Mode::Qa,
            AnswerMode::Guide(_) => Mode::Guide,
        }
    }

    /// Model behind this mode.
    pub fn model(&self) -> &str {
        match self {
            AnswerMode::Qa(qa) => qa.llm.model(),
            AnswerMode::Guide(guide) => guide.llm.model(),
        }
    }

    /// Answer `question` given retrieved context and prior history.
    ///
    /// `history` must not include the question itself.
    pub async fn respond(
        &self,
        question: &str,
        context: Option<&[String]>,
        history: &[ConversationEntry],
    ) -> Result<ModeResponse> {
        match self {
            AnswerMode::Qa(qa) => qa.respond(question, context).await,
            AnswerMode::Guide(guide) => guide.respond(question, context, history).await,
        }
    }
}

impl QaMode {
    #[instrument(skip(self, context), fields(model = %self.llm.model()))]
    async fn respond(&self, question: &str, context: Option<&[String]>) -> Result<ModeResponse> {
        let context = match context {
            Some(chunks) if !chunks.is_empty() => chunks,
            _ => {
                info!("No relevant context, returning fallback answer");
                return Ok(ModeResponse {
                    answer: self.prompts.qa.fallback_answer.clone(),
                    usage: None,
                    grounded: false,
                });
            }
        };

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(context));
        let system = self.prompts.render_with_custom(&self.prompts.qa.system, &vars);

        let messages = vec![ChatMessage::system(system), ChatMessage::user(question)];
        let completion = self.llm.complete(&messages).await?;

        debug!("Answered from {} chunks", context.len());
        Ok(ModeResponse {
            answer: completion.text,
            usage: completion.usage,
            grounded: true,
        })
    }
}

impl GuideMode {
    /// Messages sent for one guided turn.
    fn build_messages(
        &self,
        question: &str,
        context: Option<&[String]>,
        history: &[ConversationEntry],
    ) -> Vec<ChatMessage> {
        let vars = HashMap::new();
        let mut messages = vec![ChatMessage::system(
            self.prompts.render_with_custom(&self.prompts.guide.system, &vars),
        )];

        if let Some(chunks) = context.filter(|c| !c.is_empty()) {
            let mut vars = HashMap::new();
            vars.insert("context".to_string(), format_context_for_prompt(chunks));
            messages.push(ChatMessage::system(
                self.prompts.render_with_custom(&self.prompts.guide.context, &vars),
            ));
        }

        let same_mode: Vec<&ConversationEntry> =
            history.iter().filter(|e| e.mode == Mode::Guide).collect();
        let keep = self.history_window.saturating_mul(2);
        let start = same_mode.len().saturating_sub(keep);
        messages.extend(same_mode[start..].iter().map(|e| e.to_message()));

        messages.push(ChatMessage::user(question));
        messages
    }

    #[instrument(skip(self, context, history), fields(model = %self.llm.model(), history = history.len()))]
    async fn respond(
        &self,
        question: &str,
        context: Option<&[String]>,
        history: &[ConversationEntry],
    ) -> Result<ModeResponse> {
        let messages = self.build_messages(question, context, history);
        let completion = self.llm.complete(&messages).await?;

        Ok(ModeResponse {
            answer: completion.text,
            usage: completion.usage,
            grounded: context.is_some_and(|c| !c.is_empty()),
        })
    }
}
