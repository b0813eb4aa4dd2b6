//! Error types for tool operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a tool failure, reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidArgument,
    Configuration,
    Network,
    Timeout,
    Upstream,
    MalformedResponse,
    NotFound,
    Internal,
}

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The tool is not set up to run (usually a missing API key).
    #[error("{0}")]
    Configuration(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The provider reported an error.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    /// The provider has no data for the request.
    #[error("{0}")]
    NotFound(String),

    /// The provider answered with data in an unexpected shape.
    #[error("Unexpected data format: {0}")]
    MalformedResponse(String),

    /// The tool did not finish in time.
    #[error("Tool execution timed out")]
    Timeout,
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::MissingParameter(_) | ToolError::InvalidParameter { .. } => {
                ToolErrorKind::InvalidArgument
            }
            ToolError::Configuration(_) => ToolErrorKind::Configuration,
            ToolError::HttpError(e) if e.is_timeout() => ToolErrorKind::Timeout,
            ToolError::HttpError(e) if e.is_decode() => ToolErrorKind::MalformedResponse,
            ToolError::HttpError(_) => ToolErrorKind::Network,
            ToolError::MalformedResponse(_) => ToolErrorKind::MalformedResponse,
            ToolError::Upstream { .. } => ToolErrorKind::Upstream,
            ToolError::NotFound(_) => ToolErrorKind::NotFound,
            ToolError::Timeout => ToolErrorKind::Timeout,
        }
    }
}

/// Errors raised by the registry itself, before any tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    Duplicate(String),

    /// No tool with this name is registered.
    #[error("tool not available: {0}")]
    UnknownTool(String),

    /// A required argument was absent or null.
    #[error("missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },
}
