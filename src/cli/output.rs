//! CLI output formatting utilities.

use crate::llm::TokenUsage;
use crate::vector_store::SearchResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an assistant answer.
    pub fn answer(label: &str, text: &str) {
        println!("\n{} {}\n", style(format!("{}:", label)).green().bold(), text);
    }

    /// Print a retrieved chunk.
    pub fn source(result: &SearchResult) {
        println!(
            "  {} chunk {} (score: {:.2}) {}",
            style("*").cyan(),
            style(result.chunk.ordinal).bold(),
            result.score,
            style(result.chunk.preview(100)).dim()
        );
    }

    /// Print token usage, if the provider reported it.
    pub fn usage(usage: Option<&TokenUsage>) {
        if let Some(u) = usage {
            println!(
                "{}",
                style(format!(
                    "tokens: {} prompt + {} completion = {}",
                    u.prompt_tokens, u.completion_tokens, u.total_tokens
                ))
                .dim()
            );
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
