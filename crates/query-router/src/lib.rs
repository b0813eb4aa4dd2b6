//! Conversational query routing.
//!
//! For each user utterance the [`Router`] asks the language model whether a
//! live lookup is needed. Direct answers are streamed straight back; tool
//! requests are validated against the [`agent_tools::ToolRegistry`], executed
//! once, and folded into a streamed natural-language answer. A [`Session`]
//! owns the bounded conversation memory and handles the built-in commands.
//!
//! Every turn ends with an answer or a visible notice. Routing and tool
//! failures fall back to a general-knowledge answer; only a failed final
//! generation ends the turn without one.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_tools::{default_registry, StockConfig, WeatherConfig};
//! use mistral_brain::MistralBrain;
//! use query_router::{LoggingSink, Router, RouterConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = Arc::new(MistralBrain::from_env()?);
//!     let registry = Arc::new(default_registry(WeatherConfig::from_env(), StockConfig::from_env()));
//!     let mut session = Session::new(Router::new(model, registry, RouterConfig::from_env()));
//!
//!     let report = session.process("What's the weather in Delhi?", &LoggingSink).await;
//!     println!("{}", report.outcome.text());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod extract;
mod prompts;
mod router;
mod session;
mod sink;

pub use config::{RouterConfig, DEFAULT_TOOL_TIMEOUT};
pub use error::RouterError;
pub use extract::{extract_tool_request, JsonReply};
pub use prompts::{
    error_notice, load_router_prompt, render_router_prompt, DEFAULT_ROUTER_PROMPT_FILE,
    DEFAULT_ROUTER_SYSTEM_PROMPT, DEGRADED_NOTE, EMPTY_INPUT, EMPTY_RESPONSE_FALLBACK,
    GENERAL_KNOWLEDGE_PROMPT, MEMORY_CLEARED,
};
pub use router::{RouteTaken, Routed, Router, RoutingDecision, TurnOutcome, TurnReport};
pub use session::{Command, Session, SessionControl};
pub use sink::{LoggingSink, NoOpSink, RecordingSink, ResponseSink, SinkEvent};

// Re-export async_trait for sink implementations
pub use async_trait::async_trait;

/// Serialises tests that touch process-wide environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
