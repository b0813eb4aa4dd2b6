//! Error types for routing operations.

use agent_tools::{RegistryError, ToolErrorKind};
use assistant_core::ModelError;
use thiserror::Error;

/// Errors that can occur while handling a turn.
///
/// None of these abort a session. Each maps to a fallback or to a visible
/// notice that ends the turn.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// The routing call failed or timed out.
    #[error("routing decision failed: {0}")]
    Decision(ModelError),

    /// The model picked an unknown tool or left out a required argument.
    #[error("invalid tool request: {0}")]
    ToolValidation(#[from] RegistryError),

    /// The tool ran and reported a failure.
    #[error("tool '{tool}' failed ({kind:?}): {message}")]
    ToolExecution {
        tool: String,
        kind: ToolErrorKind,
        message: String,
    },

    /// The final answer could not be generated.
    #[error("generation failed: {0}")]
    Generation(ModelError),
}

impl RouterError {
    /// True when the turn still produces an answer after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RouterError::Generation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouterError::ToolValidation(RegistryError::UnknownTool("get_news".into()));
        assert_eq!(err.to_string(), "invalid tool request: tool not available: get_news");

        let err = RouterError::Generation(ModelError::Timeout);
        assert_eq!(err.to_string(), "generation failed: model call timed out");
        assert!(!err.is_recoverable());
        assert!(RouterError::Decision(ModelError::Timeout).is_recoverable());
    }
}
