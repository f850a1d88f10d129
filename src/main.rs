//! Tutorly CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tutorly::cli::{commands, Cli, Commands};
use tutorly::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging: -v flags override the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tutorly={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Chat { pdf } => {
            commands::run_chat(pdf.clone(), settings).await?;
        }

        Commands::Ask { pdf, question, guide } => {
            commands::run_ask(pdf, question, *guide, settings).await?;
        }

        Commands::Chunks {
            pdf,
            chunk_size,
            overlap,
            limit,
        } => {
            commands::run_chunks(pdf, *chunk_size, *overlap, *limit, settings).await?;
        }

        Commands::Documents { action } => {
            commands::run_documents(action.as_ref(), settings).await?;
        }

        Commands::Research {
            question,
            domain,
            level,
            source,
            lang,
        } => {
            commands::run_research(question, domain, level, source, lang.as_deref(), settings)
                .await?;
        }

        Commands::Teacher { task } => {
            commands::run_teacher(task, settings).await?;
        }

        Commands::Serve {
            host,
            port,
            session_ttl,
        } => {
            commands::run_serve(host, *port, *session_ttl, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
