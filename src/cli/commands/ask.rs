//! Ask command implementation.

use super::{load_pdf, load_prompts};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::Mode;
use crate::session::TutorSession;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(pdf: &str, question: &str, guide: bool, settings: Settings) -> Result<()> {
    let operation = if guide { Operation::Guide } else { Operation::Qa };
    for op in [Operation::Load, operation] {
        if let Err(e) = preflight::check(op, &settings) {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    }

    let prompts = load_prompts(&settings)?;
    let mut session = TutorSession::from_settings(&settings, &prompts)?;
    load_pdf(&mut session, pdf, &settings).await?;

    if !guide {
        session.set_mode(Mode::Qa)?;
    }

    let spinner = Output::spinner("Thinking...");
    let result = session.query(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::source(source);
                }
                println!();
            }
            Output::usage(response.usage.as_ref());
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
