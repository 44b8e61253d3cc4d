//! LLM provider integrations for jarvis
//!
//! One logical "send message" operation over two mutually incompatible
//! vendor API surfaces. The [`ProviderGateway`] owns one client per
//! family and dispatches on the wire family name.

pub mod anthropic;
pub mod base;
pub mod gateway;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use base::{ChatMessage, ChatProvider, ModelFamily, ProviderError, ProviderResult, Role};
pub use gateway::ProviderGateway;
pub use openai::{OpenAiClient, EMPTY_RESPONSE_PLACEHOLDER};
