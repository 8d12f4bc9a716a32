//! Transcript turns for the conversational session

use serde::{Deserialize, Serialize};

/// Role of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Question from the user
    User,
    /// Answer from the model
    Assistant,
}

/// One entry in the session transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: Role,
    /// Question or answer text
    pub content: String,
    /// When the turn was recorded
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Turn {
    /// Create a new turn stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: chrono::Utc::now(),
        }
    }
}
