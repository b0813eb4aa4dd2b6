//! Tool requests written as JSON in free text.
//!
//! Models without native function calling are asked to answer with a JSON
//! object instead. The object may sit in a fenced block, stand alone, or be
//! surrounded by prose.

use std::collections::HashMap;

use agent_tools::ToolInvocation;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A JSON routing reply found in free text.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonReply {
    /// `"use_tool": true` with a tool name.
    Tool(ToolInvocation),
    /// A routing object that asks for no tool, or names none.
    NoTool,
}

/// Look for a JSON routing object in a model reply.
///
/// Fenced blocks are tried first, in order; without any, the first object in
/// the text is used. Only objects carrying a `use_tool` key count.
pub fn extract_tool_request(text: &str) -> Option<JsonReply> {
    candidates(text)
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Map<String, Value>>(candidate).ok())
        .find(|object| object.contains_key("use_tool"))
        .map(interpret)
}

fn interpret(object: Map<String, Value>) -> JsonReply {
    let wants_tool = match object.get("use_tool") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if !wants_tool {
        debug!("JSON reply declined tool use");
        return JsonReply::NoTool;
    }

    let Some(tool_name) = object
        .get("tool_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
    else {
        warn!("JSON reply asked for a tool without naming one");
        return JsonReply::NoTool;
    };

    let arguments: HashMap<String, Value> = match object.get("tool_parameters") {
        Some(Value::Object(params)) => params.clone().into_iter().collect(),
        _ => HashMap::new(),
    };

    JsonReply::Tool(ToolInvocation::new(tool_name, arguments))
}

/// Candidate JSON slices, fenced blocks first.
fn candidates(text: &str) -> Vec<&str> {
    let fenced = fenced_blocks(text);
    if !fenced.is_empty() {
        return fenced
            .into_iter()
            .filter_map(|block| block.find('{').map(|start| balanced_object(&block[start..])))
            .collect();
    }

    text.find('{')
        .map(|start| vec![balanced_object(&text[start..])])
        .unwrap_or_default()
}

/// Contents of every ``` fenced block, without the language tag.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        // Skip an optional language tag on the opening line.
        let body_start = match after.find('\n') {
            Some(newline) if !after[..newline].contains('{') => newline + 1,
            _ => 0,
        };
        let body = &after[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(body[..close].trim());
        rest = &body[close + 3..];
    }

    blocks
}

/// Trim a string starting with '{' to its first balanced object.
///
/// Braces inside string literals are ignored. Unbalanced input is returned
/// unchanged and left for the JSON parser to reject.
fn balanced_object(s: &str) -> &str {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return &s[..=i];
                }
            }
            _ => {}
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(reply: Option<JsonReply>) -> ToolInvocation {
        match reply {
            Some(JsonReply::Tool(invocation)) => invocation,
            other => panic!("expected tool request, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_json_block() {
        let text = "Let me look that up.\n```json\n{\n  \"use_tool\": true,\n  \"tool_name\": \"get_weather\",\n  \"tool_parameters\": {\"location\": \"New York\"}\n}\n```";
        let invocation = tool(extract_tool_request(text));
        assert_eq!(invocation.tool_name, "get_weather");
        assert_eq!(invocation.arguments["location"], "New York");
        assert!(invocation.call_id.is_none());
    }

    #[test]
    fn test_bare_object_with_trailing_text() {
        let text = r#"{"use_tool": true, "tool_name": "get_stock_price", "tool_parameters": {"symbol": "AAPL"}}}} hope that helps"#;
        let invocation = tool(extract_tool_request(text));
        assert_eq!(invocation.tool_name, "get_stock_price");
        assert_eq!(invocation.arguments["symbol"], "AAPL");
    }

    #[test]
    fn test_object_after_prose() {
        let text = r#"Sure: {"use_tool": true, "tool_name": "get_weather", "tool_parameters": {"location": "Delhi {north}"}}"#;
        let invocation = tool(extract_tool_request(text));
        assert_eq!(invocation.arguments["location"], "Delhi {north}");
    }

    #[test]
    fn test_later_fence_wins_when_first_is_not_routing() {
        let text = "```\n{\"example\": 1}\n```\nand\n```json\n{\"use_tool\": true, \"tool_name\": \"get_weather\"}\n```";
        let invocation = tool(extract_tool_request(text));
        assert_eq!(invocation.tool_name, "get_weather");
        assert!(invocation.arguments.is_empty());
    }

    #[test]
    fn test_plain_answer_has_no_request() {
        assert_eq!(extract_tool_request("The capital of France is Paris."), None);
        assert_eq!(extract_tool_request("Use {curly} braces wisely"), None);
        assert_eq!(extract_tool_request(r#"{"answer": "Paris"}"#), None);
    }

    #[test]
    fn test_declined_or_nameless() {
        assert_eq!(
            extract_tool_request(r#"{"use_tool": false}"#),
            Some(JsonReply::NoTool)
        );
        assert_eq!(
            extract_tool_request(r#"{"use_tool": true, "tool_name": "  "}"#),
            Some(JsonReply::NoTool)
        );
    }

    #[test]
    fn test_balanced_object_escapes() {
        assert_eq!(balanced_object(r#"{"a": "\"}"}xyz"#), r#"{"a": "\"}"}"#);
        assert_eq!(balanced_object("{unclosed"), "{unclosed");
    }
}
