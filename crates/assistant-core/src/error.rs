//! Error types for language-model calls.

use thiserror::Error;

/// Errors that can occur while talking to a language model.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The model adapter is misconfigured (missing key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected the call because of rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered with something we could not interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A streamed response broke off part way.
    #[error("stream error: {0}")]
    Stream(String),

    /// The call did not finish in time.
    #[error("model call timed out")]
    Timeout,

    /// The model is not available to take calls.
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

impl ModelError {
    /// Map an HTTP status and body into the matching error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 {
            ModelError::RateLimited(message)
        } else {
            ModelError::Api { status, message }
        }
    }
}
