//! Base trait and shared vocabulary for chat providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unsupported model family: {0}")]
    UnsupportedFamily(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// The vendor API surface behind a logical send operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    OpenAi,
    Anthropic,
}

impl ModelFamily {
    /// Wire name of the OpenAI family
    pub const OPENAI_WIRE: &'static str = "OpenAI Models";
    /// Wire name of the Anthropic family
    pub const ANTHROPIC_WIRE: &'static str = "Anthropic Models";

    /// Parse the exact wire family name. Anything else is unsupported.
    pub fn parse(value: &str) -> ProviderResult<Self> {
        match value {
            Self::OPENAI_WIRE => Ok(Self::OpenAi),
            Self::ANTHROPIC_WIRE => Ok(Self::Anthropic),
            other => Err(ProviderError::UnsupportedFamily(other.to_string())),
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::OpenAi => Self::OPENAI_WIRE,
            Self::Anthropic => Self::ANTHROPIC_WIRE,
        }
    }
}

/// Closed author-role vocabulary for providers that reject anything
/// beyond user/assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a wire role string onto the closed vocabulary. Exactly
    /// `"user"` maps to [`Role::User`]; every other value (assistant,
    /// system, tool, unknown) defaults to [`Role::Assistant`].
    pub fn from_wire(role: &str) -> Self {
        if role == "user" {
            Self::User
        } else {
            Self::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message in the chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for chat completion providers
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one chat completion round trip and return the reply text
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> ProviderResult<String>;

    /// Get the default model for this provider
    fn default_model(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parse_exact_names() {
        assert_eq!(
            ModelFamily::parse("OpenAI Models").unwrap(),
            ModelFamily::OpenAi
        );
        assert_eq!(
            ModelFamily::parse("Anthropic Models").unwrap(),
            ModelFamily::Anthropic
        );
    }

    #[test]
    fn test_family_parse_rejects_everything_else() {
        for bad in ["openai", "OpenAI", "Google Models", ""] {
            let err = ModelFamily::parse(bad).unwrap_err();
            assert!(err.to_string().contains("Unsupported model family"));
        }
    }

    #[test]
    fn test_role_from_wire_defaults_to_assistant() {
        assert_eq!(Role::from_wire("user"), Role::User);
        assert_eq!(Role::from_wire("assistant"), Role::Assistant);
        assert_eq!(Role::from_wire("system"), Role::Assistant);
        assert_eq!(Role::from_wire("tool"), Role::Assistant);
        assert_eq!(Role::from_wire("User"), Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
