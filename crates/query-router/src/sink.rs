//! Where a turn's output goes.

use std::sync::Mutex;

use async_trait::async_trait;

/// Receives everything a turn shows to the user, in order.
///
/// Abstracted to support different front ends (terminal, tests, etc.)
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// A status note, such as the tool indicator. Not part of the answer.
    async fn status(&self, text: &str);

    /// One fragment of the answer.
    async fn fragment(&self, text: &str);

    /// A notice that ends the turn without an answer.
    async fn error(&self, text: &str);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpSink;

#[async_trait]
impl ResponseSink for NoOpSink {
    async fn status(&self, _text: &str) {}

    async fn fragment(&self, _text: &str) {}

    async fn error(&self, _text: &str) {}
}

/// A sink that logs every event.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

#[async_trait]
impl ResponseSink for LoggingSink {
    async fn status(&self, text: &str) {
        tracing::info!("[status] {}", text.trim_end());
    }

    async fn fragment(&self, text: &str) {
        tracing::debug!("[fragment] {} chars", text.len());
    }

    async fn error(&self, text: &str) {
        tracing::warn!("[error] {}", text);
    }
}

/// One event seen by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Status(String),
    Fragment(String),
    Error(String),
}

/// A sink that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    /// All events so far, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Answer fragments concatenated.
    pub fn answer(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Fragment(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn status(&self, text: &str) {
        self.record(SinkEvent::Status(text.to_string()));
    }

    async fn fragment(&self, text: &str) {
        self.record(SinkEvent::Fragment(text.to_string()));
    }

    async fn error(&self, text: &str) {
        self.record(SinkEvent::Error(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpSink;
        sink.status("checking").await;
        sink.fragment("Paris").await;
        sink.error("boom").await;
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.status("checking").await;
        sink.fragment("The capital ").await;
        sink.fragment("is Paris.").await;
        sink.error("late").await;

        assert_eq!(sink.events().len(), 4);
        assert_eq!(sink.answer(), "The capital is Paris.");
        assert_eq!(sink.statuses(), vec!["checking"]);
        assert_eq!(sink.errors(), vec!["late"]);
    }
}
