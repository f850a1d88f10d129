//! Research command implementation.

use super::load_prompts;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::llm::OpenAIChat;
use crate::search::{self, Language, ResearchQuery, SerpApiSearch, SourceKind};
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    question: &str,
    domain: &str,
    level: &str,
    source: &str,
    lang: Option<&str>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Research, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let query = ResearchQuery::new(question)
        .with_domain(domain)
        .with_level(level)
        .with_source(source.parse::<SourceKind>()?)
        .with_lang(match lang {
            Some(lang) => lang.parse::<Language>()?,
            None => Language::detect(question),
        });

    let prompts = load_prompts(&settings)?;
    let web = SerpApiSearch::from_settings(&settings.search)?;
    let llm = OpenAIChat::from_settings(&settings.guide.provider)?.with_model(&settings.search.model);

    let spinner = Output::spinner(&format!("Searching the web for: {}", query.search_terms()));
    let result = search::answer(&query, &web, &llm, &prompts).await;
    spinner.finish_and_clear();

    match result {
        Ok(research) => {
            Output::answer("Tutorly", &research.answer);

            if !research.hits.is_empty() {
                Output::header("Sources");
                for hit in &research.hits {
                    Output::list_item(&format!("{} - {}", hit.title, hit.link));
                }
                println!();
            }
            Output::usage(research.usage.as_ref());
        }
        Err(e) => {
            Output::error(&format!("Research failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
