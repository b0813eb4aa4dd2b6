//! Scripted model - replays canned responses in order.

use std::collections::VecDeque;

use assistant_core::{
    async_trait, text_stream, ChatRequest, FunctionCall, LanguageModel, ModelError, ModelResponse,
};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// One canned response.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Ask for a function call.
    Call(FunctionCall),
    /// Stream these fragments, then finish.
    Text(Vec<String>),
    /// Fail before producing anything.
    Fail(ModelError),
    /// Stream these fragments, then never finish.
    StallAfter(Vec<String>),
    /// Stream these fragments, then fail.
    BreakAfter(Vec<String>, ModelError),
}

impl Scripted {
    fn into_response(self) -> Result<ModelResponse, ModelError> {
        match self {
            Scripted::Call(call) => Ok(ModelResponse::FunctionCall(call)),
            Scripted::Text(fragments) => Ok(ModelResponse::Text(text_stream::from_fragments(
                fragments,
            ))),
            Scripted::Fail(error) => Err(error),
            Scripted::StallAfter(fragments) => {
                let head = stream::iter(fragments.into_iter().map(Ok::<String, ModelError>));
                Ok(ModelResponse::Text(head.chain(stream::pending()).boxed()))
            }
            Scripted::BreakAfter(fragments, error) => {
                let head = stream::iter(fragments.into_iter().map(Ok::<String, ModelError>));
                let tail = stream::once(futures::future::ready(Err(error)));
                Ok(ModelResponse::Text(head.chain(tail).boxed()))
            }
        }
    }
}

/// A model that answers from a script.
///
/// Each call to `complete` records the request and pops the next scripted
/// response. An exhausted script answers with `ModelError::Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    /// Create a model with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted response.
    pub fn then(mut self, response: Scripted) -> Self {
        self.script.get_mut().push_back(response);
        self
    }

    /// Append a function call. `arguments` should be a JSON object.
    pub fn then_call(self, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.then(Scripted::Call(FunctionCall::new(name, arguments)))
    }

    /// Append a single-fragment text answer.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(Scripted::Text(vec![text.into()]))
    }

    /// Append a multi-fragment text answer.
    pub fn then_fragments<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Scripted::Text(fragments.into_iter().map(Into::into).collect()))
    }

    /// Append a failure.
    pub fn then_fail(self, error: ModelError) -> Self {
        self.then(Scripted::Fail(error))
    }

    /// Append a stream that stalls after the given fragments.
    pub fn then_stall_after<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Scripted::StallAfter(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Append a stream that breaks after the given fragments.
    pub fn then_break_after<I, S>(self, fragments: I, error: ModelError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Scripted::BreakAfter(
            fragments.into_iter().map(Into::into).collect(),
            error,
        ))
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Number of scripted responses not yet used.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: ChatRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().await.push(request);
        match self.script.lock().await.pop_front() {
            Some(response) => response.into_response(),
            None => Err(ModelError::Unavailable("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "ScriptedModel"
    }
}
