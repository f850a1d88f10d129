//! Configuration settings for Tutorly.

use crate::chunking::ChunkingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub guide: GuideSettings,
    pub qa: QaSettings,
    pub search: SearchSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (extracted documents).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tutorly".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Connection settings for an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the API (e.g. `https://api.openai.com/v1`).
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Chat model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds (0 uses the client default).
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            timeout_secs: 0,
        }
    }
}

impl ProviderSettings {
    /// Whether the key for this provider is present in the environment.
    pub fn has_api_key(&self) -> bool {
        std::env::var(&self.api_key_env).is_ok_and(|k| !k.trim().is_empty())
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the embeddings API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// L2-normalise vectors before comparing them.
    pub normalize: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            normalize: true,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Window width in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Windows shorter than this are dropped (capped at the stride).
    pub min_chunk_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_chars: 200,
        }
    }
}

impl ChunkingSettings {
    /// Chunking parameters with the configured minimum length.
    pub fn config(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.chunk_size, self.overlap).with_min_chunk_chars(self.min_chunk_chars)
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the model.
    pub top_k: usize,
    /// Only chunks scoring strictly above this are used.
    pub threshold: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            threshold: None,
        }
    }
}

/// Guided tutoring mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideSettings {
    pub provider: ProviderSettings,
    /// Number of previous exchanges (user + assistant pairs) replayed to the model.
    pub history_window: usize,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            history_window: 5,
        }
    }
}

/// Direct question answering mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    pub provider: ProviderSettings,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            provider: ProviderSettings {
                api_base: "https://api.groq.com/openai/v1".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                model: "llama3-70b-8192".to_string(),
                temperature: 0.2,
                timeout_secs: 0,
            },
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// SerpAPI endpoint.
    pub endpoint: String,
    /// Environment variable holding the SerpAPI key.
    pub api_key_env: String,
    /// Number of organic results to keep.
    pub num_results: usize,
    /// Chat model used to explain search results (on the guide provider).
    pub model: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".to_string(),
            api_key_env: "SERP_API_KEY".to_string(),
            num_results: 3,
            model: "gpt-4o".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TutorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tutorly")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory holding cached document extractions.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir().join("documents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.overlap, 200);
        assert_eq!(settings.chunking.min_chunk_chars, 200);
        assert_eq!(settings.retrieval.top_k, 3);
        assert!(settings.retrieval.threshold.is_none());
        assert_eq!(settings.guide.history_window, 5);
        assert_eq!(settings.qa.provider.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.guide.provider.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            top_k = 5
            threshold = 0.6

            [qa.provider]
            model = "llama3-8b-8192"
            "#,
        )
        .unwrap();

        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.threshold, Some(0.6));
        assert_eq!(settings.qa.provider.model, "llama3-8b-8192");
        // Unspecified provider fields fall back to the generic defaults.
        assert_eq!(settings.qa.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.chunking.overlap = 50;
        settings.retrieval.threshold = Some(0.4);
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chunking.overlap, 50);
        assert_eq!(loaded.retrieval.threshold, Some(0.4));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.embedding.model, "text-embedding-3-small");
    }
}
