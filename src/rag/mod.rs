//! Retrieval and answer generation.
//!
//! A [`Retriever`] turns a question into ranked excerpts of the loaded
//! document; an [`AnswerMode`] turns the question, those excerpts and the
//! session history into a reply.

mod conversation;
mod modes;
mod retriever;

pub use conversation::{ConversationEntry, EntryRole, Mode};
pub use modes::{AnswerMode, GuideMode, ModeResponse, QaMode};
pub use retriever::{format_context_for_prompt, Retriever};
