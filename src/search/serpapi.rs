//! SerpApi client for Google and Google Scholar.

use super::{ResearchQuery, SearchHit, SourceKind, WebSearch};
use crate::config::SearchSettings;
use crate::error::{Result, TutorError};
use crate::openai::api_key_from_env;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Web search through SerpApi.
pub struct SerpApiSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    num_results: usize,
}

impl SerpApiSearch {
    pub fn new(endpoint: &str, api_key: String, num_results: usize) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            num_results,
        })
    }

    /// Create a client from settings. Fails when the API key is missing.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        Self::new(&settings.endpoint, api_key, settings.num_results)
    }

    fn request_url(&self, query: &ResearchQuery) -> Result<Url> {
        let engine = match query.source {
            SourceKind::Scholar => "google_scholar",
            SourceKind::General | SourceKind::Video => "google",
        };
        let num = self.num_results.to_string();
        let terms = query.search_terms();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", terms.as_str()),
                ("engine", engine),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| TutorError::Config(format!("Invalid search endpoint {}: {}", self.endpoint, e)))
    }
}

fn parse_hits(body: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let response: SerpResponse = serde_json::from_str(body)
        .map_err(|e| TutorError::WebSearch(format!("Malformed search response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(TutorError::WebSearch(error));
    }

    Ok(response
        .organic_results
        .into_iter()
        .filter_map(|r| {
            Some(SearchHit {
                title: r.title.unwrap_or_else(|| "Untitled".to_string()),
                link: r.link?,
                snippet: r.snippet.unwrap_or_default(),
            })
        })
        .take(limit)
        .collect())
}

#[async_trait]
impl WebSearch for SerpApiSearch {
    #[instrument(skip(self, query), fields(source = ?query.source))]
    async fn search(&self, query: &ResearchQuery) -> Result<Vec<SearchHit>> {
        let url = self.request_url(query)?;
        debug!("Searching for: {}", query.search_terms());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TutorError::WebSearch(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TutorError::WebSearch(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!("Search returned {}", status);
            return Err(TutorError::WebSearch(format!("{}: {}", status, body)));
        }

        let hits = parse_hits(&body, self.num_results)?;
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}
