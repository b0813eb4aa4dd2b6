//! Conversation memory.
//!
//! A single session keeps one bounded, ordered log of turns. The log is the
//! context handed to routing and generation calls and is mutated only by the
//! active turn, so it needs no locking.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default number of turns kept in memory.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the conversation log.
///
/// Turns are immutable once built; the memory hands out shared references only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create a tool turn holding a serialized tool result.
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_name: Some(tool_name.into()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }
}

/// Bounded, ordered conversation log.
///
/// Holds at most `max_turns` turns. When a push would exceed the limit the
/// oldest turns are dropped first.
///
/// # Example
///
/// ```rust
/// use assistant_core::{ConversationMemory, Turn};
///
/// let mut memory = ConversationMemory::new(2);
/// memory.add_user("First");
/// memory.add_assistant("Response 1");
/// memory.add_user("Second");
///
/// let contents: Vec<_> = memory.turns().map(|t| t.content()).collect();
/// assert_eq!(contents, vec!["Response 1", "Second"]);
/// ```
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationMemory {
    /// Create an empty memory holding at most `max_turns` turns.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = if max_turns == 0 {
            warn!("max_turns of 0 requested, keeping a single turn instead");
            1
        } else {
            max_turns
        };

        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest turns on overflow.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Append a user turn.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    /// Append an assistant turn.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// Append a tool turn.
    pub fn add_tool(&mut self, tool_name: impl Into<String>, content: impl Into<String>) {
        self.push(Turn::tool(tool_name, content));
    }

    /// Iterate over turns, oldest first.
    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &Turn> + ExactSizeIterator {
        self.turns.iter()
    }

    /// Copy the turns out, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Render the log for humans, one block per turn.
    ///
    /// Tool turns holding JSON are pretty-printed.
    pub fn formatted_history(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                Role::User => format!("User: {}", turn.content),
                Role::Assistant => format!("Assistant: {}", turn.content),
                Role::System => format!("System: {}", turn.content),
                Role::Tool => {
                    let name = turn.tool_name.as_deref().unwrap_or("unknown_tool");
                    let body = serde_json::from_str::<serde_json::Value>(&turn.content)
                        .ok()
                        .and_then(|v| serde_json::to_string_pretty(&v).ok())
                        .unwrap_or_else(|| turn.content.clone());
                    format!("Tool ({}): {}", name, body)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
