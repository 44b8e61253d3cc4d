//! Anthropic messages API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{ChatMessage, ChatProvider, ProviderError, ProviderResult, Role};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fixed output cap for every request through this client.
const MAX_TOKENS: u32 = 1000;

/// Messages API request format. Roles are the closed [`Role`] vocabulary;
/// the API rejects anything beyond user/assistant.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: Role,
    content: String,
}

impl From<ChatMessage> for AnthropicMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: Role::from_wire(&message.role),
            content: message.content,
        }
    }
}

/// Messages API response format
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Anthropic messages client
pub struct AnthropicClient {
    client: Client,
    api_base: String,
    api_key: String,
    default_model: String,
}

impl AnthropicClient {
    /// Create a new client. `api_base` falls back to the public endpoint.
    pub fn new(api_key: String, api_base: Option<String>, default_model: String) -> Self {
        let api_base = api_base
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            client: Client::new(),
            api_base,
            api_key,
            default_model,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> ProviderResult<String> {
        if self.api_key.is_empty() {
            return Err(ProviderError::ConfigError(
                "Anthropic API key is not configured".to_string(),
            ));
        }

        let request = MessagesRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            messages: messages.into_iter().map(AnthropicMessage::from).collect(),
        };

        debug!(
            "Sending messages request to {} with model {}",
            self.api_base, model
        );

        let url = format!("{}/v1/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let response_data: MessagesResponse = response.json().await?;
        let block = response_data.content.first().ok_or_else(|| {
            ProviderError::InvalidResponse("No content blocks in response".to_string())
        })?;

        Ok(block.text.clone())
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}
