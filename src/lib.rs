//! Tutorly - PDF tutoring with retrieval-augmented answers
//!
//! Load a course PDF, split it into overlapping chunks, embed them into an
//! in-memory index and ask questions about it.
//!
//! # Overview
//!
//! Tutorly answers in two modes:
//! - **guide**: a conversational tutor that uses retrieved context when it helps
//! - **qa**: strict question answering grounded only in the loaded document
//!
//! Alongside the tutoring session it offers web research through SerpAPI and
//! teacher tools (quiz generation, essay review, material creation).
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `documents` - PDF text extraction and the extracted-document library
//! - `chunking` - Sliding-window chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `llm` - Chat completion clients
//! - `rag` - Retrieval, answer modes and conversation history
//! - `session` - The tutoring session tying it all together
//! - `search` - Web research
//! - `teacher` - Teacher assistant tasks
//!
//! # Example
//!
//! ```rust,no_run
//! use tutorly::config::{Prompts, Settings};
//! use tutorly::rag::Mode;
//! use tutorly::session::TutorSession;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let prompts = Prompts::load(
//!         settings.prompts.custom_dir.as_deref(),
//!         Some(&settings.prompts.variables),
//!     )?;
//!     let mut session = TutorSession::from_settings(&settings, &prompts)?;
//!
//!     session.load_document(Path::new("lecture.pdf"), 1000, 200).await?;
//!     session.set_mode(Mode::Qa)?;
//!
//!     let response = session.query("What is a limit?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod search;
pub mod session;
pub mod teacher;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{Result, TutorError};
