//! Mistral API request and response types.

use assistant_core::{ChatMessage, FunctionCall, ModelError, ToolChoice, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role: "system", "user", "assistant" or "tool"
    pub role: String,
    /// Message content
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(message.tool_calls.iter().map(WireToolCall::from).collect())
        };
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
            name: message.name.clone(),
        }
    }
}

/// A function call as sent and received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function name and arguments.
///
/// Arguments are a JSON-encoded string on the way out; providers have been
/// seen to return either a string or an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: Value,
}

impl From<&FunctionCall> for WireToolCall {
    fn from(call: &FunctionCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: function_type(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: Value::String(Value::Object(call.arguments.clone()).to_string()),
            },
        }
    }
}

impl WireToolCall {
    /// Convert into the backend-neutral call.
    pub fn into_function_call(self) -> Result<FunctionCall, ModelError> {
        let arguments = parse_arguments(&self.function.name, self.function.arguments)?;
        Ok(FunctionCall {
            id: self.id.filter(|id| !id.is_empty()),
            name: self.function.name,
            arguments,
        })
    }
}

/// Decode function-call arguments from either representation.
pub fn parse_arguments(name: &str, arguments: Value) -> Result<Map<String, Value>, ModelError> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(raw) if raw.trim().is_empty() => Ok(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ModelError::MalformedResponse(format!(
                "arguments for '{}' are not an object: {}",
                name, other
            ))),
            Err(e) => Err(ModelError::MalformedResponse(format!(
                "arguments for '{}' are not valid JSON: {}",
                name, e
            ))),
        },
        other => Err(ModelError::MalformedResponse(format!(
            "arguments for '{}' are not an object: {}",
            name, other
        ))),
    }
}

/// A function definition offered to the model.
#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: WireFunctionDef,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for WireTool {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            tool_type: function_type(),
            function: WireFunctionDef {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.parameters_schema(),
            },
        }
    }
}

/// Chat completion request to the Mistral API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<WireMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Ask for server-sent events
    pub stream: bool,
    /// Functions the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// Chat completion response from the Mistral API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

/// Response message (content may be null when the model calls a function).
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One server-sent chunk of a streamed completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

/// Incremental content of a streamed choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// A fragment of a function call inside a stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    pub index: Option<usize>,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<Value>,
}

/// API error response.
///
/// Mistral reports errors either as `{"message": ...}` or in the OpenAI
/// shape `{"error": {"message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: Option<Value>,
    pub error: Option<ApiErrorDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    pub message: String,
}

impl ApiError {
    /// Best human-readable message for an error body.
    pub fn describe(body: &str) -> String {
        match serde_json::from_str::<ApiError>(body) {
            Ok(ApiError {
                error: Some(details),
                ..
            }) => details.message,
            Ok(ApiError {
                message: Some(Value::String(message)),
                ..
            }) => message,
            Ok(ApiError {
                message: Some(other),
                ..
            }) => other.to_string(),
            _ => body.trim().to_string(),
        }
    }
}
