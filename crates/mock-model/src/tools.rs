//! Tool doubles.

use std::sync::atomic::{AtomicUsize, Ordering};

use agent_tools::{Tool, ToolArgs, ToolError, ToolPayload};
use assistant_core::{async_trait, ParameterSpec};
use indexmap::IndexMap;

/// A tool that always returns the same payload.
///
/// Counts its executions so tests can assert how often it ran.
pub struct StaticTool {
    name: String,
    description: String,
    parameters: IndexMap<String, ParameterSpec>,
    payload: ToolPayload,
    calls: AtomicUsize,
}

impl StaticTool {
    pub fn new(name: impl Into<String>, payload: ToolPayload) -> Self {
        let name = name.into();
        Self {
            description: format!("Test tool {}", name),
            name,
            parameters: IndexMap::new(),
            payload,
            calls: AtomicUsize::new(0),
        }
    }

    /// Declare a required string parameter.
    pub fn with_required(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameters
            .insert(name.into(), ParameterSpec::required_string(description));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// How many times the tool has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> IndexMap<String, ParameterSpec> {
        self.parameters.clone()
    }

    async fn execute(&self, _args: ToolArgs) -> Result<ToolPayload, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

type ErrorFactory = Box<dyn Fn() -> ToolError + Send + Sync>;

/// A tool that always fails.
pub struct FailingTool {
    name: String,
    parameters: IndexMap<String, ParameterSpec>,
    make_error: ErrorFactory,
    calls: AtomicUsize,
}

impl FailingTool {
    /// Fail with whatever `make_error` builds.
    pub fn new<F>(name: impl Into<String>, make_error: F) -> Self
    where
        F: Fn() -> ToolError + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: IndexMap::new(),
            make_error: Box::new(make_error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail as if the provider reported an error.
    pub fn upstream(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(name, move || ToolError::Upstream {
            status: Some(503),
            message: message.clone(),
        })
    }

    /// Fail as if the provider never answered.
    pub fn timeout(name: impl Into<String>) -> Self {
        Self::new(name, || ToolError::Timeout)
    }

    /// Fail as if the API key were missing.
    pub fn unconfigured(name: impl Into<String>) -> Self {
        Self::new(name, || {
            ToolError::Configuration("API key is missing".to_string())
        })
    }

    /// Declare a required string parameter.
    pub fn with_required(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameters
            .insert(name.into(), ParameterSpec::required_string(description));
        self
    }

    /// How many times the tool has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "A tool that always fails"
    }

    fn parameters(&self) -> IndexMap<String, ParameterSpec> {
        self.parameters.clone()
    }

    async fn execute(&self, _args: ToolArgs) -> Result<ToolPayload, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make_error)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tools::ToolErrorKind;

    #[tokio::test]
    async fn test_static_tool() {
        let tool = StaticTool::new("get_weather", ToolPayload::new().with("temperature", 31.5))
            .with_required("location", "City");

        let payload = tool.execute(ToolArgs::default()).await.unwrap();
        assert_eq!(payload.get("temperature"), Some(&serde_json::json!(31.5)));
        assert_eq!(tool.calls(), 1);
        assert_eq!(
            tool.descriptor().required_parameters().collect::<Vec<_>>(),
            vec!["location"]
        );
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let tool = FailingTool::upstream("get_weather", "service down");
        let err = tool.execute(ToolArgs::default()).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Upstream);
        assert_eq!(err.to_string(), "service down");

        let err = FailingTool::timeout("slow").execute(ToolArgs::default()).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Timeout);
        assert_eq!(tool.calls(), 1);
    }
}
