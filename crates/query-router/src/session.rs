//! A conversation: one router, one memory, sequential turns.

use assistant_core::ConversationMemory;
use tracing::info;

use crate::prompts::{EMPTY_INPUT, MEMORY_CLEARED};
use crate::router::{Router, TurnReport};
use crate::sink::ResponseSink;

/// A line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Empty,
    Query(String),
}

impl Command {
    /// Classify a raw input line. Command words are case-insensitive.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Command::Empty,
            "exit" | "quit" | "bye" => Command::Exit,
            "clear" | "reset" => Command::Clear,
            _ => Command::Query(trimmed.to_string()),
        }
    }
}

/// Whether the session should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Exit,
}

/// One user's conversation.
///
/// Turns run strictly one at a time. Dropping an in-flight [`Session::process`]
/// future leaves the user turn recorded and no partial answer.
pub struct Session {
    router: Router,
    memory: ConversationMemory,
}

impl Session {
    pub fn new(router: Router) -> Self {
        let memory = ConversationMemory::new(router.config().max_turns);
        Self { router, memory }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Forget the conversation so far.
    pub fn clear(&mut self) {
        self.memory.clear();
        info!("Conversation memory cleared");
    }

    /// Run one turn for `utterance`.
    pub async fn process(&mut self, utterance: &str, sink: &dyn ResponseSink) -> TurnReport {
        self.router
            .process_turn(&mut self.memory, utterance, sink)
            .await
    }

    /// Handle one raw input line, including the built-in commands.
    pub async fn handle(&mut self, line: &str, sink: &dyn ResponseSink) -> SessionControl {
        match Command::parse(line) {
            Command::Exit => return SessionControl::Exit,
            Command::Clear => {
                self.clear();
                sink.status(MEMORY_CLEARED).await;
            }
            Command::Empty => sink.status(EMPTY_INPUT).await,
            Command::Query(utterance) => {
                self.process(&utterance, sink).await;
            }
        }
        SessionControl::Continue
    }
}
