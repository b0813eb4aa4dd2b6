//! Tool descriptors.
//!
//! A descriptor is what the routing step sees of a tool: its name, what it
//! does and which parameters it takes. The same descriptor drives argument
//! validation before a tool runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    /// A required string parameter.
    pub fn required_string(description: impl Into<String>) -> Self {
        Self {
            param_type: ParamType::String,
            description: description.into(),
            required: true,
        }
    }

    /// An optional string parameter.
    pub fn optional_string(description: impl Into<String>) -> Self {
        Self {
            param_type: ParamType::String,
            description: description.into(),
            required: false,
        }
    }
}

/// Immutable description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: IndexMap<String, ParameterSpec>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: IndexMap<String, ParameterSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names of the parameters that must be present.
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
    }

    /// JSON Schema for the parameters, as used by function-calling APIs.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for (name, spec) in &self.parameters {
            properties.insert(
                name.clone(),
                json!({
                    "type": spec.param_type,
                    "description": spec.description,
                }),
            );
        }

        let required: Vec<&str> = self.required_parameters().collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Compact listing used inside prompts.
    pub fn to_prompt_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}
