//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, TutorError};
use crate::openai::{api_key_from_env, create_client_with_timeout};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// OpenAI has a limit on batch size.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings, reading the API key from the environment.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        let client =
            create_client_with_timeout(&settings.api_base, &api_key, Duration::from_secs(120))?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            dimensions: settings.dimensions as usize,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TutorError::embedding(0, "Empty embedding response"))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            let offset = batch_no * BATCH_SIZE;

            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()));
            if self.dimensions > 0 {
                args.dimensions(self.dimensions as u32);
            }

            let request = args
                .build()
                .map_err(|e| TutorError::embedding(offset, format!("Failed to build request: {}", e)))?;

            let response = self.client.embeddings().create(request).await.map_err(|e| {
                warn!("Embedding batch starting at {} failed: {}", offset, e);
                TutorError::embedding(offset, format!("Embedding API error: {}", e))
            })?;

            let data = response
                .data
                .into_iter()
                .map(|e| (e.index as usize, e.embedding))
                .collect();

            all_embeddings.extend(order_batch(offset, batch.len(), self.dimensions, data)?);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Put a batch response back in input order and check it is complete.
///
/// `data` pairs each vector with its index inside the batch.
fn order_batch(
    offset: usize,
    expected: usize,
    dimensions: usize,
    mut data: Vec<(usize, Vec<f32>)>,
) -> Result<Vec<Vec<f32>>> {
    data.sort_by_key(|(index, _)| *index);

    let mut ordered = Vec::with_capacity(expected);
    for position in 0..expected {
        match data.get(position) {
            Some((index, vector)) if *index == position => {
                if dimensions > 0 && vector.len() != dimensions {
                    return Err(TutorError::embedding(
                        offset + position,
                        format!("expected {} dimensions, got {}", dimensions, vector.len()),
                    ));
                }
                ordered.push(vector.clone());
            }
            _ => {
                return Err(TutorError::embedding(
                    offset + position,
                    format!("response is missing an embedding ({} of {} returned)", data.len(), expected),
                ));
            }
        }
    }

    if data.len() > expected {
        return Err(TutorError::embedding(
            offset,
            format!("response has {} embeddings for {} inputs", data.len(), expected),
        ));
    }

    Ok(ordered)
}
