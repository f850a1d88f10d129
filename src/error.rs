//! Error types for Tutorly.

use thiserror::Error;

/// Library-level error type for Tutorly operations.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read document: {0}")]
    DocumentRead(String),

    /// The embedding capability failed or returned malformed output.
    ///
    /// `index` is the position (in the submitted batch) of the first input
    /// the failure applies to, so callers can retry just that suffix.
    #[error("Embedding service failed at input {index}: {cause}")]
    EmbeddingService { index: usize, cause: String },

    #[error("Embedding mismatch: {0}")]
    EmbeddingMismatch(String),

    #[error("Language model error: {0}")]
    LanguageModel(String),

    #[error("Mode unavailable: {0}")]
    ModeUnavailable(String),

    #[error("Web search failed: {0}")]
    WebSearch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TutorError {
    /// Shorthand for an embedding failure at a given input position.
    pub fn embedding(index: usize, cause: impl Into<String>) -> Self {
        TutorError::EmbeddingService {
            index,
            cause: cause.into(),
        }
    }

    /// Whether the failure came from an external capability (embedding,
    /// language model, web search, HTTP) rather than from local input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            TutorError::EmbeddingService { .. }
                | TutorError::LanguageModel(_)
                | TutorError::WebSearch(_)
                | TutorError::Http(_)
        )
    }
}

/// Result type alias for Tutorly operations.
pub type Result<T> = std::result::Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_error_reports_index() {
        let err = TutorError::embedding(100, "timeout");
        assert_eq!(err.to_string(), "Embedding service failed at input 100: timeout");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_local_errors_are_not_upstream() {
        assert!(!TutorError::ModeUnavailable("qa".into()).is_upstream());
        assert!(!TutorError::InvalidInput("x".into()).is_upstream());
    }
}
