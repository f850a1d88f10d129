//! Tutoring answers built on web search results.

use super::{format_hits, Language, ResearchQuery, SearchHit, WebSearch};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, TokenUsage};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Explanation of search results, with the hits it was based on.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchAnswer {
    pub answer: String,
    pub hits: Vec<SearchHit>,
    pub usage: Option<TokenUsage>,
}

/// Search the web for a question and have the model explain what it found.
///
/// With no hits the model is still asked, with an empty result list, so the
/// student gets an explanation and guiding questions either way.
#[instrument(skip_all, fields(question = %query.question))]
pub async fn answer(
    query: &ResearchQuery,
    search: &dyn WebSearch,
    llm: &dyn ChatModel,
    prompts: &Prompts,
) -> Result<ResearchAnswer> {
    let hits = search.search(query).await?;
    info!("Found {} sources", hits.len());

    let mut vars = HashMap::new();
    vars.insert("level".to_string(), query.level.clone());
    vars.insert("domain".to_string(), query.domain.clone());
    vars.insert("results".to_string(), format_hits(&hits));
    vars.insert("question".to_string(), query.question.clone());

    let user = match query.lang {
        Language::En => &prompts.research.user,
        Language::Ro => &prompts.research.user_ro,
    };
    let messages = vec![
        ChatMessage::system(prompts.render_with_custom(&prompts.research.system, &vars)),
        ChatMessage::user(prompts.render_with_custom(user, &vars)),
    ];
    let completion = llm.complete(&messages).await?;

    Ok(ResearchAnswer {
        answer: completion.text,
        hits,
        usage: completion.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TutorError;
    use crate::search::SourceKind;
    use crate::test_support::MockChatModel;
    use async_trait::async_trait;

    struct FixedSearch(std::result::Result<Vec<SearchHit>, String>);

    #[async_trait]
    impl WebSearch for FixedSearch {
        async fn search(&self, _query: &ResearchQuery) -> Result<Vec<SearchHit>> {
            self.0.clone().map_err(TutorError::WebSearch)
        }
    }

    #[tokio::test]
    async fn test_answer_renders_results_into_prompt() {
        let search = FixedSearch(Ok(vec![SearchHit {
            title: "Newton's laws".to_string(),
            link: "https://example.org/newton".to_string(),
            snippet: "Force equals mass times acceleration.".to_string(),
        }]));
        let llm = MockChatModel::new("Think about what happens when you push a cart.");
        let query = ResearchQuery::new("What is force?")
            .with_domain("physics")
            .with_level("high school")
            .with_source(SourceKind::Video);

        let result = answer(&query, &search, &llm, &Prompts::default()).await.unwrap();

        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.answer, "Think about what happens when you push a cart.");
        let request = llm.last_request();
        assert_eq!(request.len(), 2);
        let user = &request[1].content;
        assert!(user.contains("high school student interested in physics"));
        assert!(user.contains("https://example.org/newton"));
        assert!(user.contains("Student Question: What is force?"));
    }

    #[tokio::test]
    async fn test_romanian_question_uses_romanian_prompt() {
        let search = FixedSearch(Ok(Vec::new()));
        let llm = MockChatModel::new("Gândește-te la o căruță împinsă.");
        let query = ResearchQuery::new("Ce este forța?")
            .with_domain("fizică")
            .with_level("liceu")
            .with_lang(Language::Ro);

        answer(&query, &search, &llm, &Prompts::default()).await.unwrap();

        let user = &llm.last_request()[1].content;
        assert!(user.contains("un elev de nivel liceu interesat de domeniul fizică"));
        assert!(user.contains("Întrebarea elevului: Ce este forța?"));
    }

    #[tokio::test]
    async fn test_search_failure_skips_model() {
        let search = FixedSearch(Err("quota exceeded".to_string()));
        let llm = MockChatModel::new("unused");

        let result = answer(&ResearchQuery::new("q"), &search, &llm, &Prompts::default()).await;
        assert!(matches!(result, Err(TutorError::WebSearch(_))));
        assert_eq!(llm.calls(), 0);
    }
}
