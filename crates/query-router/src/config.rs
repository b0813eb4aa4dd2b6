//! Router configuration.

use std::env;
use std::time::Duration;

use assistant_core::DEFAULT_MAX_TURNS;

/// Default upper bound on a single tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for the router and its session.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Memory capacity, in turns.
    pub max_turns: usize,

    /// Bound on each model call and on each wait for a streamed fragment.
    pub call_timeout: Option<Duration>,

    /// Bound on each tool execution.
    pub tool_timeout: Option<Duration>,

    /// Routing system prompt override. `{tools}` is replaced with the tool listing.
    pub system_prompt: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            call_timeout: None,
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            system_prompt: None,
        }
    }
}

impl RouterConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ASSISTANT_MAX_TURNS` - Memory capacity (default: 10)
    /// - `ASSISTANT_CALL_TIMEOUT_SECS` - Model call timeout (default: none)
    /// - `ASSISTANT_TOOL_TIMEOUT_SECS` - Tool timeout (default: 15, 0 disables)
    ///
    /// The routing prompt override comes from [`crate::load_router_prompt`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_turns = env::var("ASSISTANT_MAX_TURNS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_turns);

        let call_timeout = env::var("ASSISTANT_CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let tool_timeout = match env::var("ASSISTANT_TOOL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.tool_timeout,
        };

        Self {
            max_turns,
            call_timeout,
            tool_timeout,
            system_prompt: crate::prompts::load_router_prompt(),
        }
    }

    /// Set the memory capacity.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Bound each model call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Bound each tool execution; `None` removes the bound.
    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Override the routing system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}
