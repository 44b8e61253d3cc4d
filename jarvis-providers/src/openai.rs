//! OpenAI-compatible chat completion client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{ChatMessage, ChatProvider, ProviderError, ProviderResult};

/// Substituted when the provider returns an empty or missing choice.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No response generated.";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Chat completion request format
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

/// Chat completion response format
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completion client
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    default_model: String,
}

impl OpenAiClient {
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
impl ChatProvider for OpenAiClient {
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> ProviderResult<String> {
        if self.api_key.is_empty() {
            return Err(ProviderError::ConfigError(
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
        };

        debug!(
            "Sending chat request to {} with model {}",
            self.api_base, model
        );

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let response_data: ChatCompletionResponse = response.json().await?;
        let choice = response_data
            .choices
            .first()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        // Empty replies get a fixed placeholder instead of an error
        match &choice.message.content {
            Some(content) if !content.is_empty() => Ok(content.clone()),
            _ => Ok(EMPTY_RESPONSE_PLACEHOLDER.to_string()),
        }
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}
