//! Web research: search the web for a student question and explain the
//! results in a tutoring voice.

mod research;
mod serpapi;

pub use research::{answer, ResearchAnswer};
pub use serpapi::SerpApiSearch;

use crate::error::{Result, TutorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of resources to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    General,
    /// Academic literature (Google Scholar).
    Scholar,
    /// Videos on YouTube.
    Video,
}

impl std::str::FromStr for SourceKind {
    type Err = TutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" | "web" => Ok(SourceKind::General),
            "scholar" | "academic" => Ok(SourceKind::Scholar),
            "video" | "videos" | "youtube" => Ok(SourceKind::Video),
            _ => Err(TutorError::InvalidInput(format!(
                "Unknown source: {}. Choose general, scholar or video",
                s
            ))),
        }
    }
}

/// Language of a question, which picks the search region and prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    /// Romanian: results restricted to `.ro` sites, answered in Romanian.
    Ro,
}

impl Language {
    /// Detect the language of a question. Anything not recognised as
    /// Romanian is treated as English.
    pub fn detect(text: &str) -> Self {
        match whatlang::detect(text) {
            Some(info) if info.lang() == whatlang::Lang::Ron => Language::Ro,
            _ => Language::En,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = TutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ro" | "romanian" | "română" => Ok(Language::Ro),
            _ => Err(TutorError::InvalidInput(format!(
                "Unknown language: {}. Choose en or ro",
                s
            ))),
        }
    }
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// A student question with the preferences that shape the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub question: String,
    /// Subject area, e.g. "physics".
    pub domain: String,
    /// Student level, e.g. "high school" or "university".
    pub level: String,
    pub source: SourceKind,
    #[serde(default)]
    pub lang: Language,
}

impl ResearchQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            domain: "general".to_string(),
            level: "student".to_string(),
            source: SourceKind::General,
            lang: Language::En,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    /// Search engine query string.
    pub fn search_terms(&self) -> String {
        let region = match self.lang {
            Language::Ro => " site:.ro",
            Language::En => "",
        };
        match self.source {
            SourceKind::Video => {
                format!("{} {} site:youtube.com{}", self.question, self.domain, region)
            }
            SourceKind::General | SourceKind::Scholar => {
                format!("{} {} {}{}", self.question, self.domain, self.level, region)
            }
        }
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search for a query. Every failure is a `WebSearch` error.
    async fn search(&self, query: &ResearchQuery) -> Result<Vec<SearchHit>>;
}

/// Format hits as prompt text: title, link and snippet per hit.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("{}\n{}\n{}\n", h.title, h.link, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}
