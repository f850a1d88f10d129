//! CLI command implementations.

mod ask;
mod chat;
mod chunks;
mod config;
mod documents;
mod research;
mod serve;
mod teacher;

pub use ask::run_ask;
pub use chat::run_chat;
pub use chunks::run_chunks;
pub use config::run_config;
pub use documents::run_documents;
pub use research::run_research;
pub use serve::run_serve;
pub use teacher::run_teacher;

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::documents::{PdfExtractor, TextExtractor};
use crate::error::Result;
use crate::session::{DocumentSummary, TutorSession};

/// Prompts with the configured overrides and variables applied.
fn load_prompts(settings: &Settings) -> Result<Prompts> {
    Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )
}

/// Load a PDF into a session with the configured chunking, showing a spinner.
async fn load_pdf(session: &mut TutorSession, path: &str, settings: &Settings) -> Result<DocumentSummary> {
    let spinner = Output::spinner(&format!("Loading {}...", path));
    let result = session
        .load_document(
            &Settings::expand_path(path),
            settings.chunking.chunk_size,
            settings.chunking.overlap,
        )
        .await;
    spinner.finish_and_clear();

    let summary = result?;
    Output::success(&format!(
        "Loaded {} ({} pages, {} chunks)",
        summary.title.as_deref().unwrap_or(&summary.doc_id),
        summary.page_count,
        summary.chunk_count
    ));
    Ok(summary)
}

/// Text of a PDF, or of any other file read as UTF-8.
async fn read_material(path: &str) -> Result<String> {
    let path = Settings::expand_path(path);
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Ok(PdfExtractor::new().extract(&path).await?.full_text())
    } else {
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}
