//! Tool trait definition and types.

use std::collections::HashMap;

use assistant_core::{FunctionCall, ParameterSpec, ToolDescriptor};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolErrorKind};

/// Arguments passed to a tool for execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: HashMap<String, Value>,
}

impl ToolArgs {
    /// Create new tool arguments with the given parameters.
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self { params }
    }

    /// Get a string parameter, returning an error if missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::InvalidParameter {
                name: key.to_string(),
                reason: "expected string".to_string(),
            })
    }

    /// Get an optional string parameter.
    pub fn get_string_opt(&self, key: &str) -> Option<String> {
        self.params.get(key)?.as_str().map(|s| s.to_string())
    }
}

/// Structured data returned by a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolPayload(Map<String, Value>);

impl ToolPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Outcome of a tool run, as data.
///
/// Failures never leave the registry as errors; they become `Failure` values
/// that the router folds into its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { data: ToolPayload },
    Failure { kind: ToolErrorKind, message: String },
}

impl ToolResult {
    pub fn success(data: ToolPayload) -> Self {
        ToolResult::Success { data }
    }

    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        ToolResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(error: &ToolError) -> Self {
        Self::failure(error.kind(), error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    /// Compact JSON rendering used as model context and stored in memory.
    pub fn to_fragment(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"failure","kind":"internal","message":"{}"}}"#, e)
        })
    }
}

/// A request to run a tool, produced by the routing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: HashMap<String, Value>,
    /// Provider call ID, carried through to the follow-up request.
    pub call_id: Option<String>,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: HashMap<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            call_id: None,
        }
    }

    /// Render back into a function call for the follow-up request.
    pub fn to_function_call(&self) -> FunctionCall {
        let arguments: Map<String, Value> = self
            .arguments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        FunctionCall {
            id: self.call_id.clone(),
            name: self.tool_name.clone(),
            arguments,
        }
    }
}

impl From<FunctionCall> for ToolInvocation {
    fn from(call: FunctionCall) -> Self {
        Self {
            tool_name: call.name,
            arguments: call.arguments.into_iter().collect(),
            call_id: call.id,
        }
    }
}

/// Trait for tools the router can invoke.
///
/// Tools wrap one external data provider each. Every failure mode must come
/// back as a [`ToolError`]; implementations never panic on bad input or bad
/// upstream data.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (used for dispatch).
    fn name(&self) -> &str;

    /// Human-readable description the model uses to pick a tool.
    fn description(&self) -> &str;

    /// Declared parameters, in presentation order.
    fn parameters(&self) -> IndexMap<String, ParameterSpec>;

    /// Full descriptor for routing and validation.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.parameters())
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: ToolArgs) -> Result<ToolPayload, ToolError>;
}
