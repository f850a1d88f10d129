//! Documents command implementation.

use crate::cli::{DocumentsAction, Output};
use crate::config::Settings;
use crate::documents::DocumentLibrary;
use anyhow::Result;
use console::style;

/// Run the documents command.
pub async fn run_documents(action: Option<&DocumentsAction>, settings: Settings) -> Result<()> {
    let library = DocumentLibrary::new(settings.documents_dir());

    match action {
        Some(DocumentsAction::Remove { doc_id }) => remove_document(&library, doc_id),
        Some(DocumentsAction::List) | None => list_documents(&library),
    }
}

fn remove_document(library: &DocumentLibrary, doc_id: &str) -> Result<()> {
    if library.remove(doc_id)? {
        Output::success(&format!("Removed {} from the library", doc_id));
    } else {
        Output::warning(&format!("No extracted document named {}", doc_id));
    }
    Ok(())
}

fn list_documents(library: &DocumentLibrary) -> Result<()> {
    match library.list() {
        Ok(documents) => {
            if documents.is_empty() {
                Output::info("No documents extracted yet. Use 'tutorly chat --pdf <file>' to add one.");
            } else {
                Output::header(&format!("Documents ({})", documents.len()));
                println!();

                for doc in &documents {
                    let title = doc.title.as_deref().unwrap_or(&doc.doc_id);
                    let author = doc
                        .author
                        .as_deref()
                        .map(|a| format!(", {}", a))
                        .unwrap_or_default();
                    println!(
                        "  {} {} ({}{}, {} pages)",
                        style("*").cyan(),
                        style(title).bold(),
                        style(&doc.doc_id).dim(),
                        author,
                        doc.page_count
                    );
                }

                let total_pages: usize = documents.iter().map(|d| d.page_count).sum();
                println!();
                Output::kv("Library", &library.dir().display().to_string());
                Output::kv("Total pages", &total_pages.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
