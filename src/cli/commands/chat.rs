//! Interactive tutoring session.

use super::{load_pdf, load_prompts};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{EntryRole, Mode};
use crate::session::{ModeChange, TutorSession};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

const HELP: &str = "Commands: mode <guide|qa>, load <pdf>, unload, clear, history, help, exit";

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Exit,
    Help,
    Clear,
    History,
    Unload,
    Mode(&'a str),
    Load(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> Option<ChatInput<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let input = match (command.to_lowercase().as_str(), rest.is_empty()) {
        ("exit" | "quit", true) => ChatInput::Exit,
        ("help", true) => ChatInput::Help,
        ("clear", true) => ChatInput::Clear,
        ("history", true) => ChatInput::History,
        ("unload", true) => ChatInput::Unload,
        ("mode", false) => ChatInput::Mode(rest),
        ("load", false) => ChatInput::Load(rest),
        _ => ChatInput::Question(line),
    };
    Some(input)
}

/// Run the interactive chat command.
pub async fn run_chat(pdf: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Guide, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let prompts = load_prompts(&settings)?;
    let mut session = TutorSession::from_settings(&settings, &prompts)?;

    if let Some(path) = &pdf {
        if let Err(e) = load_pdf(&mut session, path, &settings).await {
            Output::error(&format!("{}", e));
        }
    }

    println!("\n{}", style("Tutorly").bold().cyan());
    println!("{}\n", style(HELP).dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!(
            "{} ",
            style(format!("[{}] You:", session.active_mode())).green().bold()
        );
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Help => Output::info(HELP),
            ChatInput::Clear => {
                let cleared = session.clear_history();
                Output::info(&format!("Conversation history cleared ({} entries).", cleared));
            }
            ChatInput::History => print_history(&session),
            ChatInput::Unload => match session.unload_document() {
                Some(doc) => Output::info(&format!("Unloaded {}.", doc.doc_id)),
                None => Output::warning("No document loaded."),
            },
            ChatInput::Mode(name) => match name.parse::<Mode>().and_then(|m| session.set_mode(m)) {
                Ok(ModeChange::AlreadyActive) => {
                    Output::info(&format!("Already in {} mode.", session.active_mode()))
                }
                Ok(ModeChange::Switched { .. }) => {
                    Output::success(&format!("Switched to {} mode.", session.active_mode()))
                }
                Err(e) => Output::error(&format!("{}", e)),
            },
            ChatInput::Load(path) => {
                if let Err(e) = load_pdf(&mut session, path, &settings).await {
                    Output::error(&format!("{}", e));
                }
            }
            ChatInput::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = session.query(question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(response) => {
                        Output::answer("Tutorly", &response.answer);
                        Output::usage(response.usage.as_ref());
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

fn print_history(session: &TutorSession) {
    if session.history().is_empty() {
        Output::info("No history yet.");
        return;
    }

    Output::header(&format!("History ({} mode)", session.active_mode()));
    for entry in session.history() {
        let who = match entry.role {
            EntryRole::User => style("You").green(),
            EntryRole::Assistant => style("Tutorly").cyan(),
        };
        println!(
            "  {} {}: {}",
            style(entry.created_at.format("%H:%M:%S")).dim(),
            who,
            entry.content
        );
    }
    println!();
}
