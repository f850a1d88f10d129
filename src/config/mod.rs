//! Configuration module for Tutorly.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GuidePrompts, Prompts, QaPrompts, ResearchPrompts, TeacherPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, GuideSettings, PromptSettings,
    ProviderSettings, QaSettings, RetrievalSettings, SearchSettings, Settings,
};
