//! Tool registry for managing and executing tools.

use std::sync::Arc;

use assistant_core::ToolDescriptor;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, ToolErrorKind};
use crate::tool::{Tool, ToolArgs, ToolInvocation, ToolResult};

/// Registry for managing tools.
///
/// Built once at startup and read-only afterwards. Tools keep their
/// registration order, which is also the order descriptors are offered to
/// the model.
pub struct ToolRegistry {
    /// Registered tools by name.
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Register a tool.
    ///
    /// Names are unique; registering a second tool under an existing name fails.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a shared tool.
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        info!("Registering tool: {}", name);
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a list of registered tool names.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors of every registered tool, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Check an invocation against the target tool's descriptor.
    ///
    /// Returns the tool when the name is registered and every required
    /// parameter is present and non-null.
    pub fn validate(&self, invocation: &ToolInvocation) -> Result<Arc<dyn Tool>, RegistryError> {
        let tool = self
            .tools
            .get(&invocation.tool_name)
            .ok_or_else(|| RegistryError::UnknownTool(invocation.tool_name.clone()))?;

        let descriptor = tool.descriptor();
        for required in descriptor.required_parameters() {
            match invocation.arguments.get(required) {
                None | Some(Value::Null) => {
                    return Err(RegistryError::MissingArgument {
                        tool: invocation.tool_name.clone(),
                        argument: required.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(tool.clone())
    }

    /// Execute a tool once and report the outcome as data.
    ///
    /// Never fails: an unknown name or a tool error comes back as
    /// [`ToolResult::Failure`]. Callers that need a time limit wrap the call.
    pub async fn execute(&self, invocation: &ToolInvocation) -> ToolResult {
        let name = invocation.tool_name.as_str();
        let Some(tool) = self.tools.get(name) else {
            warn!("Tool not found: {}", name);
            return ToolResult::failure(ToolErrorKind::NotFound, format!("Tool not found: {}", name));
        };

        debug!(
            "Executing tool '{}' with {} params",
            name,
            invocation.arguments.len()
        );

        let args = ToolArgs::new(invocation.arguments.clone());
        match tool.execute(args).await {
            Ok(payload) => {
                debug!("Tool '{}' completed with {} fields", name, payload.len());
                ToolResult::success(payload)
            }
            Err(error) => {
                warn!(
                    tool = %name,
                    kind = ?error.kind(),
                    error = %error,
                    "Tool execution failed"
                );
                ToolResult::from_error(&error)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
