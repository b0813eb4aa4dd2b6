//! The language-model contract.
//!
//! Routing and answer generation both go through [`LanguageModel::complete`].
//! A completion either asks for a function call or produces text, and text
//! always arrives as a [`TextStream`] so callers render it incrementally.

use std::fmt;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::history::{Role, Turn};
use crate::tools::ToolDescriptor;

/// Lazy, finite sequence of text fragments.
///
/// The stream can be driven once; dropping it abandons the underlying call.
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

/// A request by the model to call a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Provider-assigned call ID, when the provider supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A chat message sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Function calls made by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<FunctionCall>,
    /// For tool messages, the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool messages, the name of the tool that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant message that carries a function call and no text.
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            tool_calls: vec![call],
            ..Self::plain(Role::Assistant, "")
        }
    }

    /// A tool message answering the call `tool_call_id`.
    pub fn tool(
        name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        let mut message = Self::plain(turn.role(), turn.content());
        message.name = turn.tool_name().map(str::to_string);
        message
    }
}

/// Whether the model may call functions for this request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
}

/// A completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Tools offered to the model as callable functions.
    pub tools: Vec<ToolDescriptor>,
    pub tool_choice: ToolChoice,
    /// Ask the provider for incremental output.
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// The model's answer to a request.
pub enum ModelResponse {
    /// The model asked to call a function.
    FunctionCall(FunctionCall),
    /// The model produced text.
    Text(TextStream),
}

impl fmt::Debug for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::FunctionCall(call) => f.debug_tuple("FunctionCall").field(call).finish(),
            ModelResponse::Text(_) => f.write_str("Text(..)"),
        }
    }
}

/// Trait for language-model backends.
///
/// Implementations must be object-safe so the router can hold an
/// `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run a completion.
    ///
    /// Errors returned here happen before any text is produced; errors inside
    /// a returned [`TextStream`] happen part way through.
    async fn complete(&self, request: ChatRequest) -> Result<ModelResponse, ModelError>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}

/// Helpers for building text streams.
pub mod text_stream {
    use super::*;

    /// A stream yielding a single fragment.
    pub fn once(text: impl Into<String>) -> TextStream {
        stream::once(futures::future::ready(Ok(text.into()))).boxed()
    }

    /// A stream yielding the given fragments in order.
    pub fn from_fragments<I, S>(fragments: I) -> TextStream
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<Result<String, ModelError>> =
            fragments.into_iter().map(|f| Ok(f.into())).collect();
        stream::iter(fragments).boxed()
    }

    /// An empty stream.
    pub fn empty() -> TextStream {
        stream::empty().boxed()
    }
}

/// Drive a stream to completion and concatenate its fragments.
pub async fn collect_text(mut stream: TextStream) -> Result<String, ModelError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_text() {
        let text = collect_text(text_stream::from_fragments(["Hel", "lo", "!"]))
            .await
            .unwrap();
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn test_collect_text_propagates_error() {
        let stream = stream::iter(vec![
            Ok("partial".to_string()),
            Err(ModelError::Stream("connection reset".to_string())),
        ])
        .boxed();

        let result = collect_text(stream).await;
        assert!(matches!(result, Err(ModelError::Stream(_))));
    }

    #[test]
    fn test_chat_message_from_turn() {
        let turn = Turn::tool("get_weather", "{}");
        let message = ChatMessage::from(&turn);
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn test_assistant_call_message() {
        let call = FunctionCall::new("get_weather", Map::new()).with_id("abc123def");
        let message = ChatMessage::assistant_call(call.clone());
        assert_eq!(message.role, Role::Assistant);
        assert!(message.content.is_empty());
        assert_eq!(message.tool_calls, vec![call]);
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_tool_choice(ToolChoice::None)
            .streaming(true);
        assert!(request.stream);
        assert_eq!(request.tool_choice, ToolChoice::None);
        assert!(request.tools.is_empty());
    }
}
