//! Chunks command: show how a PDF is split before indexing.

use crate::chunking::chunk_document;
use crate::cli::Output;
use crate::config::Settings;
use crate::documents::{CachingExtractor, DocumentLibrary, PdfExtractor, TextExtractor};
use anyhow::Result;
use std::sync::Arc;

/// Run the chunks command.
pub async fn run_chunks(
    pdf: &str,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    let mut config = settings.chunking.config();
    if let Some(size) = chunk_size {
        config.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        config.overlap = overlap;
    }

    let extractor = CachingExtractor::new(
        Arc::new(PdfExtractor::new()),
        DocumentLibrary::new(settings.documents_dir()),
    );

    let spinner = Output::spinner(&format!("Extracting {}...", pdf));
    let extracted = extractor.extract(&Settings::expand_path(pdf)).await;
    spinner.finish_and_clear();
    let extracted = extracted?;

    let text = extracted.full_text();
    let chunks = chunk_document(extracted.doc_id(), &text, &config)?;

    Output::header(&format!("Chunks of {}", extracted.doc_id()));
    Output::kv("Pages", &extracted.metadata.page_count.to_string());
    Output::kv("Characters", &text.chars().count().to_string());
    Output::kv(
        "Window",
        &format!(
            "{} chars, overlap {}, minimum {}",
            config.chunk_size,
            config.overlap,
            config.effective_min_chars()
        ),
    );
    Output::kv("Chunks", &chunks.len().to_string());
    println!();

    for chunk in chunks.iter().take(limit) {
        Output::list_item(&format!(
            "#{} ({} chars) {}",
            chunk.ordinal,
            chunk.char_len(),
            chunk.preview(80)
        ));
    }
    if chunks.len() > limit {
        Output::info(&format!("... {} more", chunks.len() - limit));
    }

    Ok(())
}
