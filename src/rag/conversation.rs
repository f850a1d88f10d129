//! Conversation history entries.

use crate::error::TutorError;
use crate::llm::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response strategy of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Socratic tutoring that never hands over a full solution.
    #[default]
    Guide,
    /// Direct answers grounded in the loaded document.
    Qa,
}

impl std::str::FromStr for Mode {
    type Err = TutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guide" => Ok(Mode::Guide),
            "qa" => Ok(Mode::Qa),
            _ => Err(TutorError::InvalidInput(format!(
                "Unknown mode: {}. Choose 'guide' or 'qa'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Guide => write!(f, "guide"),
            Mode::Qa => write!(f, "qa"),
        }
    }
}

/// Who wrote a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    Assistant,
}

/// One turn of a session's history, tagged with the mode it was made in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: EntryRole,
    pub content: String,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>, mode: Mode) -> Self {
        Self {
            role: EntryRole::User,
            content: content.into(),
            mode,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, mode: Mode) -> Self {
        Self {
            role: EntryRole::Assistant,
            content: content.into(),
            mode,
            created_at: Utc::now(),
        }
    }

    /// The entry as a chat message.
    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            EntryRole::User => ChatMessage::user(self.content.clone()),
            EntryRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("guide".parse::<Mode>().unwrap(), Mode::Guide);
        assert_eq!(" QA ".parse::<Mode>().unwrap(), Mode::Qa);
        assert!("tutor".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Guide);
        assert_eq!(Mode::Qa.to_string(), "qa");
    }

    #[test]
    fn test_entry_serializes_lowercase_tags() {
        let entry = ConversationEntry::user("hi", Mode::Qa);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["mode"], "qa");
    }

    #[test]
    fn test_entry_to_message() {
        assert_eq!(ConversationEntry::user("q", Mode::Guide).to_message().role, Role::User);
        assert_eq!(
            ConversationEntry::assistant("a", Mode::Guide).to_message().role,
            Role::Assistant
        );
    }
}
