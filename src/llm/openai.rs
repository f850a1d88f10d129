//! OpenAI-compatible chat completions (OpenAI, Groq).

use super::{ChatMessage, ChatModel, Completion, Role, TokenUsage};
use crate::config::ProviderSettings;
use crate::error::{Result, TutorError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Chat client for one provider and model.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChat {
    /// Create a chat client from provider settings.
    pub fn from_settings(provider: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(provider)?,
            model: provider.model.clone(),
            temperature: provider.temperature,
        })
    }

    /// Use a different model on the same provider.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: std::result::Result<ChatCompletionRequestMessage, _> = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
    };
    built.map_err(|e| TutorError::LanguageModel(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl ChatModel for OpenAIChat {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TutorError::LanguageModel(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("Chat completion failed: {}", e);
            TutorError::LanguageModel(format!("Failed to generate response: {}", e))
        })?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TutorError::LanguageModel("Empty response from LLM".to_string()))?
            .clone();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!("Completion of {} chars, usage {:?}", text.len(), usage);
        Ok(Completion { text, usage })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_converts() {
        for message in [
            ChatMessage::system("rules"),
            ChatMessage::user("question"),
            ChatMessage::assistant("answer"),
        ] {
            assert!(to_request_message(&message).is_ok());
        }
    }

    #[test]
    fn test_missing_key_fails_construction() {
        let provider = ProviderSettings {
            api_key_env: "TUTORLY_TEST_CHAT_KEY_UNSET".to_string(),
            ..ProviderSettings::default()
        };
        assert!(matches!(
            OpenAIChat::from_settings(&provider),
            Err(TutorError::Config(_))
        ));
    }
}
