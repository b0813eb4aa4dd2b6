//! Mistral chat-completions backend.
//!
//! Implements [`LanguageModel`] on top of `POST /v1/chat/completions`:
//!
//! - Blocking requests for routing decisions, where a function call in the
//!   response takes precedence over any text.
//! - Server-sent event streaming for answers, exposed as a lazy
//!   [`TextStream`](assistant_core::TextStream).
//! - Native function calling from registered tool descriptors.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mistral_brain::MistralBrain;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = MistralBrain::from_env()?;
//!     println!("model: {}", brain.config().model);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;
mod stream;

pub use brain::MistralBrain;
pub use config::{MistralConfig, MistralConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};

// Re-export core types for convenience
pub use assistant_core::{async_trait, LanguageModel, ModelError};
