//! Provider gateway: one send operation over both vendor families

use jarvis_core::config::Config;
use tracing::debug;

use crate::anthropic::AnthropicClient;
use crate::base::{ChatMessage, ChatProvider, ModelFamily, ProviderResult};
use crate::openai::OpenAiClient;

/// Dispatches a conversation turn to the vendor client selected by the
/// wire family name.
///
/// Constructed once at startup from the loaded configuration and passed
/// to whoever needs it; there are no module-level client singletons.
pub struct ProviderGateway {
    openai: OpenAiClient,
    anthropic: AnthropicClient,
}

impl ProviderGateway {
    /// Create a gateway from explicit clients
    pub fn new(openai: OpenAiClient, anthropic: AnthropicClient) -> Self {
        Self { openai, anthropic }
    }

    /// Create a gateway from configuration
    pub fn from_config(config: &Config) -> Self {
        let openai = OpenAiClient::new(
            config.providers.openai.api_key.clone(),
            config.providers.openai.api_base.clone(),
            config.defaults.openai_model.clone(),
        );
        let anthropic = AnthropicClient::new(
            config.providers.anthropic.api_key.clone(),
            config.providers.anthropic.api_base.clone(),
            config.defaults.anthropic_model.clone(),
        );
        Self::new(openai, anthropic)
    }

    /// Send one conversation turn. The outgoing message list is exactly
    /// `history + [user turn]`, in that order. One synchronous round
    /// trip; failures propagate to the caller untouched.
    pub async fn chat(
        &self,
        family: &str,
        model: &str,
        history: Vec<ChatMessage>,
        message: &str,
    ) -> ProviderResult<String> {
        let family = ModelFamily::parse(family)?;

        let mut messages = history;
        messages.push(ChatMessage::user(message));

        debug!(
            family = family.wire_name(),
            model,
            turns = messages.len(),
            "dispatching chat request"
        );

        match family {
            ModelFamily::OpenAi => self.openai.chat(messages, model).await,
            ModelFamily::Anthropic => self.anthropic.chat(messages, model).await,
        }
    }

    /// Default model for a wire family name
    pub fn default_model(&self, family: &str) -> ProviderResult<String> {
        Ok(match ModelFamily::parse(family)? {
            ModelFamily::OpenAi => self.openai.default_model(),
            ModelFamily::Anthropic => self.anthropic.default_model(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ProviderError;
    use serde_json::json;

    fn gateway_for(server: &mockito::ServerGuard) -> ProviderGateway {
        ProviderGateway::new(
            OpenAiClient::new(
                "sk-test".to_string(),
                Some(server.url()),
                "gpt-4".to_string(),
            ),
            AnthropicClient::new(
                "sk-ant-test".to_string(),
                Some(server.url()),
                "claude-3-opus-20240229".to_string(),
            ),
        )
    }

    #[tokio::test]
    async fn test_chat_appends_user_turn_to_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Json(json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"},
                    {"role": "user", "content": "Tell me a joke"}
                ]
            })))
            .with_status(200)
            .with_body(
                json!({"choices": [{"message": {"content": "Knock knock."}}]}).to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let reply = gateway
            .chat(
                "OpenAI Models",
                "gpt-4",
                vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")],
                "Tell me a joke",
            )
            .await
            .unwrap();

        assert_eq!(reply, "Knock knock.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_with_empty_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Json(json!({
                "model": "gpt-4",
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .with_status(200)
            .with_body(json!({"choices": [{"message": {"content": ""}}]}).to_string())
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let reply = gateway
            .chat("OpenAI Models", "gpt-4", Vec::new(), "Hello")
            .await
            .unwrap();

        assert_eq!(reply, crate::EMPTY_RESPONSE_PLACEHOLDER);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_dispatches_anthropic_family() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(mockito::Matcher::Json(json!({
                "model": "claude-3-opus-20240229",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .with_status(200)
            .with_body(json!({"content": [{"type": "text", "text": "Hi!"}]}).to_string())
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let reply = gateway
            .chat("Anthropic Models", "claude-3-opus-20240229", Vec::new(), "Hello")
            .await
            .unwrap();

        assert_eq!(reply, "Hi!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_family_is_rejected() {
        let server = mockito::Server::new_async().await;
        let gateway = gateway_for(&server);

        let err = gateway
            .chat("Google Models", "gemini", Vec::new(), "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedFamily(_)));
        assert!(err.to_string().contains("Unsupported model family"));
    }

    #[test]
    fn test_default_model_per_family() {
        let gateway = ProviderGateway::new(
            OpenAiClient::new("k".to_string(), None, "gpt-4".to_string()),
            AnthropicClient::new("k".to_string(), None, "claude-3-opus-20240229".to_string()),
        );
        assert_eq!(gateway.default_model("OpenAI Models").unwrap(), "gpt-4");
        assert_eq!(
            gateway.default_model("Anthropic Models").unwrap(),
            "claude-3-opus-20240229"
        );
        assert!(gateway.default_model("nope").is_err());
    }
}
