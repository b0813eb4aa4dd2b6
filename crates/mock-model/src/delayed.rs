//! Delayed model implementation - wraps another model with artificial delay.

use std::time::Duration;

use assistant_core::{async_trait, ChatRequest, LanguageModel, ModelError, ModelResponse};
use tokio::time::sleep;

/// A model that wraps another model and adds artificial delay.
///
/// Useful for testing timeout handling and simulating provider latency.
pub struct DelayedModel<M: LanguageModel> {
    inner: M,
    delay: Duration,
}

impl<M: LanguageModel> DelayedModel<M> {
    /// Create a new DelayedModel wrapping the given model with the specified delay.
    pub fn new(inner: M, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a model with a delay in milliseconds.
    pub fn with_millis(inner: M, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a model with a delay in seconds.
    pub fn with_secs(inner: M, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// The wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for DelayedModel<M> {
    async fn complete(&self, request: ChatRequest) -> Result<ModelResponse, ModelError> {
        sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        "DelayedModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedModel;
    use assistant_core::ChatMessage;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_model() {
        let model = DelayedModel::with_millis(ScriptedModel::new().then_text("ok"), 100);

        let start = Instant::now();
        let response = model
            .complete(ChatRequest::new(vec![ChatMessage::user("test")]))
            .await
            .unwrap();

        assert!(matches!(response, ModelResponse::Text(_)));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(model.inner().request_count().await, 1);
    }

    #[tokio::test]
    async fn test_model_name() {
        let model = DelayedModel::with_millis(ScriptedModel::new(), 0);
        assert_eq!(model.name(), "DelayedModel");
    }
}
