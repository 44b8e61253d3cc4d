//! Session data structures

use serde::{Deserialize, Serialize};

/// Sentinel model tag carried by synthesized failure turns.
pub const ERROR_MODEL: &str = "Error";

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Session identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Turns in append order
    pub turns: Vec<Turn>,
}

impl Session {
    /// Create a new empty session
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            turns: Vec::new(),
        }
    }

    /// Append a turn to the session
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

/// One message exchanged in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Author role (user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
    /// Originating model, or [`ERROR_MODEL`] for synthesized failures
    pub model: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            model: model.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            model: model.into(),
        }
    }

    /// Create the synthetic assistant turn shown when a send fails
    pub fn error(message: impl AsRef<str>) -> Self {
        let mut content = "Sorry, there was an error processing your request.".to_string();
        let detail = message.as_ref();
        if !detail.is_empty() {
            content.push(' ');
            content.push_str(detail);
        }
        Self {
            role: "assistant".to_string(),
            content,
            model: ERROR_MODEL.to_string(),
        }
    }
}
