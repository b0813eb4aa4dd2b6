//! Configuration for MistralBrain.

use assistant_core::ModelError;
use std::env;
use std::time::Duration;

/// Default Mistral API URL.
pub const DEFAULT_API_URL: &str = "https://api.mistral.ai";

/// Default model. Needs function-calling support.
pub const DEFAULT_MODEL: &str = "mistral-small-latest";

/// Configuration for MistralBrain.
#[derive(Debug, Clone)]
pub struct MistralConfig {
    /// Mistral API URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 1.0).
    pub temperature: Option<f32>,

    /// Timeout for blocking requests, for connecting and for each read of a stream.
    pub timeout: Duration,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.7),
            timeout: Duration::from_secs(60),
        }
    }
}

impl MistralConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `MISTRAL_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `MISTRAL_API_URL` - API URL (default: https://api.mistral.ai)
    /// - `MISTRAL_MODEL` - Model name (default: mistral-small-latest)
    /// - `MISTRAL_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `MISTRAL_TEMPERATURE` - Temperature (default: 0.7)
    /// - `MISTRAL_TIMEOUT_SECS` - Request timeout in seconds (default: 60)
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = env::var("MISTRAL_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::Configuration("MISTRAL_API_KEY not set".to_string()))?;

        let api_url = env::var("MISTRAL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("MISTRAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_tokens = env::var("MISTRAL_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("MISTRAL_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.7));

        let timeout = env::var("MISTRAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> MistralConfigBuilder {
        MistralConfigBuilder::default()
    }

    /// Chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for MistralConfig.
#[derive(Debug, Default)]
pub struct MistralConfigBuilder {
    config: MistralConfig,
}

impl MistralConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the config.
    pub fn build(self) -> MistralConfig {
        self.config
    }
}
