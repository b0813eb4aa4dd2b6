//! Core types shared by every part of the Q&A assistant.
//!
//! This crate defines the pieces the router, the tools and the model adapters
//! agree on:
//!
//! - [`ConversationMemory`] / [`Turn`] - The bounded conversation log
//! - [`ToolDescriptor`] / [`ParameterSpec`] - Declared tool capabilities
//! - [`LanguageModel`] - The trait every completion backend implements
//! - [`ModelError`] - Error types for model calls
//!
//! # Example
//!
//! ```rust
//! use assistant_core::{ConversationMemory, Role, Turn};
//!
//! let mut memory = ConversationMemory::new(4);
//! memory.push(Turn::user("What is the capital of France?"));
//! memory.push(Turn::assistant("Paris."));
//!
//! assert_eq!(memory.len(), 2);
//! assert_eq!(memory.last().map(|t| t.role()), Some(Role::Assistant));
//! ```

mod error;
mod history;
mod model;
mod prompt;
mod tools;

pub use error::ModelError;
pub use history::{ConversationMemory, Role, Turn, DEFAULT_MAX_TURNS};
pub use model::{
    collect_text, text_stream, ChatMessage, ChatRequest, FunctionCall, LanguageModel,
    ModelResponse, TextStream, ToolChoice,
};
pub use prompt::{call_id_for, hash_prompt};
pub use tools::{ParamType, ParameterSpec, ToolDescriptor};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
