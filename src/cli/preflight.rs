//! Pre-flight checks before expensive operations.
//!
//! Validates that the API keys an operation needs are present before
//! starting work that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TutorError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Loading a document requires the embedding key.
    Load,
    /// Guided tutoring requires the guide provider key.
    Guide,
    /// Direct answers require the embedding and QA provider keys.
    Qa,
    /// Web research requires the search key and the guide provider key.
    Research,
    /// Teacher tasks run on the QA provider.
    Teacher,
    /// Inspecting chunks has no external requirements.
    Chunks,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Load => {
            check_key(&settings.embedding.api_key_env)?;
        }
        Operation::Guide => {
            check_key(&settings.guide.provider.api_key_env)?;
        }
        Operation::Qa => {
            check_key(&settings.embedding.api_key_env)?;
            check_key(&settings.qa.provider.api_key_env)?;
        }
        Operation::Research => {
            check_key(&settings.search.api_key_env)?;
            check_key(&settings.guide.provider.api_key_env)?;
        }
        Operation::Teacher => {
            check_key(&settings.qa.provider.api_key_env)?;
        }
        Operation::Chunks => {}
    }
    Ok(())
}

/// Check that an API key variable is set and non-empty.
fn check_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(TutorError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(TutorError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_chunks_no_requirements() {
        assert!(check(Operation::Chunks, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut settings = Settings::default();
        settings.qa.provider.api_key_env = "TUTORLY_TEST_PREFLIGHT_UNSET".to_string();

        match check(Operation::Teacher, &settings) {
            Err(TutorError::Config(msg)) => assert!(msg.contains("TUTORLY_TEST_PREFLIGHT_UNSET")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
