//! Configuration for the studio.
//!
//! Configuration is represented as plain immutable structs that are
//! constructed once and passed into each component. The only external
//! surface is the `BASE_URL` / `API_KEY` pair identifying the remote
//! model provider.

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    /// An invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Endpoint and credential for the remote model provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible endpoint, without the `/v1` suffix.
    pub base_url: String,
    /// Bearer token for authentication.
    pub api_key: String,
}

impl ProviderConfig {
    /// Create a provider configuration from explicit values.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Load the provider configuration from `BASE_URL` and `API_KEY`.
    pub fn from_env() -> ConfigResult<Self> {
        let base_url =
            std::env::var("BASE_URL").map_err(|_| ConfigError::MissingEnv("BASE_URL"))?;
        let api_key = std::env::var("API_KEY").map_err(|_| ConfigError::MissingEnv("API_KEY"))?;
        Ok(Self::new(base_url, api_key))
    }
}

/// Studio-level defaults for models and loop policy.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Model driving the orchestration loop and the search tool.
    pub chat_model: String,
    /// Model used for image generation.
    pub image_model: String,
    /// Default aspect ratio for generated images.
    pub aspect_ratio: String,
    /// Hard ceiling on information searches per run.
    pub max_searches: usize,
    /// Hard ceiling on reasoning steps per run.
    pub max_steps: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            chat_model: "gemini-2.5-flash-lite-preview-06-17".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            aspect_ratio: "1:1".to_string(),
            max_searches: 2,
            max_steps: 8,
        }
    }
}

impl StudioConfig {
    /// Validate the configured limits.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidValue(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if self.aspect_ratio.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "aspect_ratio must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = StudioConfig::default();
        assert_eq!(config.max_searches, 2);
        assert_eq!(config.aspect_ratio, "1:1");
        assert!(config.max_steps >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_steps_rejected() {
        let config = StudioConfig {
            max_steps: 0,
            ..StudioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn provider_config_from_values() {
        let config = ProviderConfig::new("https://llm.example.com", "sk-test");
        assert_eq!(config.base_url, "https://llm.example.com");
        assert_eq!(config.api_key, "sk-test");
    }
}
