//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for jarvis
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider credentials and endpoints
    pub providers: ProvidersConfig,
    /// Default family/model selection
    pub defaults: DefaultsConfig,
    /// Relational persistence
    pub database: DatabaseConfig,
    /// HTTP server
    pub server: ServerConfig,
    /// Client-side settings (chat endpoint, user identity)
    pub client: ClientConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// API key
    #[serde(default)]
    pub api_key: String,
    /// API base URL override
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

/// Default family and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default model family, one of the wire family names
    pub family: String,
    /// Default model for the OpenAI family
    pub openai_model: String,
    /// Default model for the Anthropic family
    pub anthropic_model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            family: "OpenAI Models".to_string(),
            openai_model: "gpt-4".to_string(),
            anthropic_model: "claude-3-opus-20240229".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://~/.jarvis/jarvis.db`.
    /// Required by `serve`; an empty value is a startup failure there.
    #[serde(default)]
    pub url: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the jarvis API the chat client talks to
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// User identity sent to the persistence API
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_api_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_id: default_user_id(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
