//! Test doubles for the query router.
//!
//! This crate provides stand-ins for the external collaborators:
//! - `ScriptedModel` - Replays a queue of canned model responses
//! - `DelayedModel` - Wraps another model with artificial delay
//! - `StaticTool` - A tool that always returns the same payload
//! - `FailingTool` - A tool that always fails
//!
//! For production use, see the `mistral-brain` crate.
//!
//! # Example
//!
//! ```rust
//! use mock_model::{LanguageModel, ScriptedModel};
//! use assistant_core::{collect_text, ChatMessage, ChatRequest, ModelResponse};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), assistant_core::ModelError> {
//!     let model = ScriptedModel::new().then_text("Paris.");
//!
//!     let request = ChatRequest::new(vec![ChatMessage::user("Capital of France?")]);
//!     if let ModelResponse::Text(stream) = model.complete(request).await? {
//!         println!("{}", collect_text(stream).await?);
//!     }
//!     Ok(())
//! }
//! ```

mod delayed;
mod scripted;
mod tools;

// Re-export core types for convenience
pub use assistant_core::{async_trait, LanguageModel, ModelError};

pub use delayed::DelayedModel;
pub use scripted::{Scripted, ScriptedModel};
pub use tools::{FailingTool, StaticTool};
