//! CLI module for Tutorly.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tutorly - document-grounded tutoring
///
/// Load a PDF and either get Socratic guidance or direct answers drawn from it.
#[derive(Parser, Debug)]
#[command(name = "tutorly")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// PDF to load before the session starts
        #[arg(long)]
        pdf: Option<String>,
    },

    /// Ask one question about a PDF
    Ask {
        /// PDF to answer from
        pdf: String,

        /// The question to ask
        question: String,

        /// Get Socratic guidance instead of a direct answer
        #[arg(short, long)]
        guide: bool,
    },

    /// Show how a PDF is split into chunks
    Chunks {
        /// PDF to chunk
        pdf: String,

        /// Window width in characters (defaults to config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by consecutive windows (defaults to config)
        #[arg(long)]
        overlap: Option<usize>,

        /// Maximum number of chunks to preview
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List or remove extracted documents in the library
    Documents {
        #[command(subcommand)]
        action: Option<DocumentsAction>,
    },

    /// Research a question on the web and get a guided explanation
    Research {
        /// The question to research
        question: String,

        /// Subject area (e.g. math, physics)
        #[arg(short, long, default_value = "general")]
        domain: String,

        /// Student level (e.g. "high school", university)
        #[arg(short, long, default_value = "student")]
        level: String,

        /// Resource type: general, scholar or video
        #[arg(short, long, default_value = "general")]
        source: String,

        /// Question language: en or ro (detected when omitted)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Assistant tasks for teachers
    Teacher {
        #[command(subcommand)]
        task: TeacherAction,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Drop sessions idle for this many seconds (0 keeps them forever)
        #[arg(long, default_value = "3600")]
        session_ttl: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum TeacherAction {
    /// Generate multiple choice questions from course material
    Quiz {
        /// PDF or text file with the material
        #[arg(long, conflicts_with = "text")]
        file: Option<String>,

        /// Material pasted directly
        #[arg(long)]
        text: Option<String>,
    },

    /// Evaluate a student essay
    Essay {
        /// PDF or text file with the essay
        file: String,
    },

    /// Generate personalised study material
    Material {
        /// Topic to cover
        topic: String,

        /// Target level
        #[arg(short, long, default_value = "high school")]
        level: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocumentsAction {
    /// List extracted documents (default)
    List,

    /// Remove a cached extraction so the PDF is read again next time
    Remove {
        /// Document id (the PDF's file stem)
        doc_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_guide() {
        let cli = Cli::parse_from(["tutorly", "-v", "ask", "notes.pdf", "What is a vector?", "--guide"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask { pdf, question, guide } => {
                assert_eq!(pdf, "notes.pdf");
                assert_eq!(question, "What is a vector?");
                assert!(guide);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_documents_actions() {
        let cli = Cli::parse_from(["tutorly", "documents"]);
        assert!(matches!(cli.command, Commands::Documents { action: None }));

        let cli = Cli::parse_from(["tutorly", "documents", "remove", "week1"]);
        match cli.command {
            Commands::Documents {
                action: Some(DocumentsAction::Remove { doc_id }),
            } => assert_eq!(doc_id, "week1"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_research_language() {
        let cli = Cli::parse_from(["tutorly", "research", "ce este forța", "--lang", "ro"]);
        match cli.command {
            Commands::Research { lang, source, .. } => {
                assert_eq!(lang.as_deref(), Some("ro"));
                assert_eq!(source, "general");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quiz_sources_conflict() {
        let result = Cli::try_parse_from(["tutorly", "teacher", "quiz", "--file", "a.pdf", "--text", "b"]);
        assert!(result.is_err());
    }
}
