//! Prompt templates and user-facing notes.

use std::env;
use std::path::Path;

use agent_tools::ToolResult;
use assistant_core::ToolDescriptor;
use tracing::info;

/// Default path for the routing prompt file.
pub const DEFAULT_ROUTER_PROMPT_FILE: &str = "ROUTER_PROMPT.md";

/// Placeholder replaced with the JSON tool listing.
pub const TOOLS_PLACEHOLDER: &str = "{tools}";

/// Default routing system prompt.
///
/// Tells the model when to answer directly and when to ask for a tool, either
/// through a native function call or the fenced JSON protocol below.
pub const DEFAULT_ROUTER_SYSTEM_PROMPT: &str = r#"You are an intelligent Q&A Assistant designed to help users by answering questions and performing actions.

Your capabilities:
1. Answer general knowledge questions directly using your built-in knowledge
2. Call external tools to fetch real-time or specialized information when needed

AVAILABLE TOOLS:
{tools}

INSTRUCTIONS:
- For general knowledge questions that don't require real-time data (like "Who is Albert Einstein?"), answer directly.
- For questions about real-time information (like weather or stock prices), use the appropriate tool.
- Analyze each query carefully to determine if it requires a tool or can be answered with general knowledge.

HOW TO USE TOOLS:
Call the tool as a function. If you cannot call functions, respond with only this JSON:

```json
{
  "use_tool": true,
  "tool_name": "[name of the tool]",
  "tool_parameters": {
    "[parameter name]": "[parameter value]"
  }
}
```

EXAMPLES:

[USER: What is the capital of France?]
→ The capital of France is Paris.

[USER: What's the weather in New York right now?]
→ {"use_tool": true, "tool_name": "get_weather", "tool_parameters": {"location": "New York"}}

[USER: What is the season in Delhi if current month is March?]
→ It is spring season.

[USER: What's the current price of Apple stock?]
→ {"use_tool": true, "tool_name": "get_stock_price", "tool_parameters": {"symbol": "AAPL"}}

IMPORTANT:
- Only use the tools listed above.
- If a question is ambiguous, ask for clarification instead of using a tool."#;

/// System prompt for answers drawn from general knowledge alone.
pub const GENERAL_KNOWLEDGE_PROMPT: &str =
    "You are a helpful AI assistant. Answer the user's question based on your general knowledge.";

/// Shown ahead of a best-effort answer when routing failed.
pub const DEGRADED_NOTE: &str =
    "I couldn't work out whether a live lookup was needed, so here's a best-effort answer.";

/// Recorded in place of an empty generation.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I apologize, but I couldn't generate a response.";

/// Shown after `clear`.
pub const MEMORY_CLEARED: &str = "Memory cleared. Let's start fresh!";

/// Shown for blank input.
pub const EMPTY_INPUT: &str = "Please enter a question or command.";

/// Load a routing prompt override.
///
/// Priority:
/// 1. `ROUTER_SYSTEM_PROMPT` env var (if set)
/// 2. Contents of prompt file (`ROUTER_PROMPT_FILE` or default `ROUTER_PROMPT.md`)
///
/// Returns `None` when neither is present, meaning the embedded default applies.
pub fn load_router_prompt() -> Option<String> {
    if let Ok(prompt) = env::var("ROUTER_SYSTEM_PROMPT") {
        info!("Using router prompt from ROUTER_SYSTEM_PROMPT env var");
        return Some(prompt);
    }

    let prompt_file = env::var("ROUTER_PROMPT_FILE")
        .unwrap_or_else(|_| DEFAULT_ROUTER_PROMPT_FILE.to_string());

    let prompt = load_prompt_file(&prompt_file);
    if prompt.is_some() {
        info!("Loaded router prompt from {}", prompt_file);
    }
    prompt
}

/// Read a prompt file, treating a missing or blank file as absent.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build the routing system prompt for a set of tools.
pub fn render_router_prompt(template: Option<&str>, tools: &[ToolDescriptor]) -> String {
    let listing: Vec<_> = tools.iter().map(ToolDescriptor::to_prompt_value).collect();
    let listing = serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "[]".to_string());

    template
        .unwrap_or(DEFAULT_ROUTER_SYSTEM_PROMPT)
        .replace(TOOLS_PLACEHOLDER, &listing)
}

/// System prompt for turning a tool result into the final answer.
pub fn fold_system_prompt(tool_name: &str, result: &ToolResult, question: &str) -> String {
    let outcome = match result {
        ToolResult::Success { .. } => {
            "Answer the question naturally using only the data in the tool message. \
             Do not add figures the tool did not return."
                .to_string()
        }
        ToolResult::Failure { message, .. } => format!(
            "The tool could not provide the data ({}). Apologise briefly, explain what went \
             wrong in a friendly manner and suggest alternatives. Do not invent live data; \
             offer only general background you are sure of.",
            message
        ),
    };

    format!(
        "You are a helpful AI assistant.\n\nThe user asked: \"{}\"\n\nYou used the \"{}\" tool; \
         its result is in the tool message that follows.\n\n{}",
        question, tool_name, outcome
    )
}

/// Status note shown before a tool runs.
pub fn tool_indicator(tool_name: &str) -> String {
    format!("I'll check that for you using {}...\n\n", tool_name)
}

/// Status note shown when the model asked for a tool that isn't registered.
pub fn unavailable_tool_note(tool_name: &str) -> String {
    format!(
        "I attempted to use a tool called '{}', but it's not available. Let me answer based on what I know.\n\n",
        tool_name
    )
}

/// Status note shown when the model left out a required tool argument.
pub fn missing_argument_note(tool_name: &str, argument: &str) -> String {
    format!(
        "I tried to use '{}' but didn't have the '{}' it needs. Let me answer based on what I know.\n\n",
        tool_name, argument
    )
}

/// Notice shown when a turn ends without an answer.
pub fn error_notice(detail: impl std::fmt::Display) -> String {
    format!("I encountered an error: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tools::{ToolErrorKind, ToolPayload};
    use assistant_core::ParameterSpec;
    use indexmap::IndexMap;

    fn weather_descriptor() -> ToolDescriptor {
        let mut parameters = IndexMap::new();
        parameters.insert(
            "location".to_string(),
            ParameterSpec::required_string("City name"),
        );
        ToolDescriptor::new("get_weather", "Get current weather", parameters)
    }

    #[test]
    fn test_render_default_prompt() {
        let prompt = render_router_prompt(None, &[weather_descriptor()]);
        assert!(!prompt.contains(TOOLS_PLACEHOLDER));
        assert!(prompt.contains("\"name\": \"get_weather\""));
        assert!(prompt.contains("capital of France"));
        assert!(prompt.contains("\"use_tool\": true"));
    }

    #[test]
    fn test_render_override() {
        let prompt = render_router_prompt(Some("Tools: {tools}"), &[]);
        assert_eq!(prompt, "Tools: []");

        let prompt = render_router_prompt(Some("No listing here"), &[weather_descriptor()]);
        assert_eq!(prompt, "No listing here");
    }

    #[test]
    fn test_fold_prompt_variants() {
        let ok = ToolResult::success(ToolPayload::new().with("price", 189.5));
        let prompt = fold_system_prompt("get_stock_price", &ok, "Apple stock?");
        assert!(prompt.contains("The user asked: \"Apple stock?\""));
        assert!(prompt.contains("using only the data"));

        let failed = ToolResult::failure(ToolErrorKind::Timeout, "Tool execution timed out");
        let prompt = fold_system_prompt("get_weather", &failed, "Weather?");
        assert!(prompt.contains("Tool execution timed out"));
        assert!(prompt.contains("Do not invent live data"));
    }

    #[test]
    fn test_notes() {
        assert_eq!(
            tool_indicator("get_weather"),
            "I'll check that for you using get_weather...\n\n"
        );
        assert!(unavailable_tool_note("get_news").starts_with(
            "I attempted to use a tool called 'get_news', but it's not available."
        ));
        assert_eq!(error_notice("boom"), "I encountered an error: boom");
    }

    #[test]
    fn test_load_router_prompt_sources() {
        let _guard = crate::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let dir = std::env::temp_dir().join(format!("router-prompt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("ROUTER_PROMPT.md");

        env::remove_var("ROUTER_SYSTEM_PROMPT");
        env::set_var("ROUTER_PROMPT_FILE", &file);
        assert_eq!(load_router_prompt(), None);

        std::fs::write(&file, "   \n").unwrap();
        assert_eq!(load_router_prompt(), None);

        std::fs::write(&file, "  From file {tools}\n").unwrap();
        assert_eq!(load_router_prompt().as_deref(), Some("From file {tools}"));

        env::set_var("ROUTER_SYSTEM_PROMPT", "From env");
        assert_eq!(load_router_prompt().as_deref(), Some("From env"));

        env::remove_var("ROUTER_SYSTEM_PROMPT");
        env::remove_var("ROUTER_PROMPT_FILE");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
