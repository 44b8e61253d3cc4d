//! Configuration validation rules.

use super::schema::Config;

/// Wire names of the supported model families.
pub const SUPPORTED_FAMILIES: [&str; 2] = ["OpenAI Models", "Anthropic Models"];

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if !SUPPORTED_FAMILIES.contains(&config.defaults.family.as_str()) {
        errors.push(format!(
            "defaults.family must be one of {:?}",
            SUPPORTED_FAMILIES
        ));
    }
    if config.defaults.openai_model.trim().is_empty() {
        errors.push("defaults.openai_model must not be empty".to_string());
    }
    if config.defaults.anthropic_model.trim().is_empty() {
        errors.push("defaults.anthropic_model must not be empty".to_string());
    }

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".to_string());
    }

    if config.client.api_url.trim().is_empty() {
        errors.push("client.api_url must not be empty".to_string());
    }
    if config.client.user_id.trim().is_empty() {
        errors.push("client.user_id must not be empty".to_string());
    }

    // database.url is intentionally not checked here: it is only required
    // when running the server, which enforces it at startup.

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
