//! Server-sent event handling for streamed completions.

use assistant_core::{FunctionCall, ModelError, ModelResponse, TextStream};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest_eventsource::{Error as SseError, Event, EventSource};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api_types::{parse_arguments, ChatCompletionChunk, ChunkDelta, ToolCallDelta};

/// Stream of choice deltas, ending at `[DONE]` or when the server closes.
pub(crate) type DeltaStream = BoxStream<'static, Result<ChunkDelta, ModelError>>;

/// Turn an open event source into a stream of deltas.
///
/// The source is closed on `[DONE]`, on the first error and when the
/// returned stream is dropped.
pub(crate) fn delta_stream(source: EventSource) -> DeltaStream {
    stream::unfold(Some(source), |state| async move {
        let mut source = state?;
        loop {
            match source.next().await {
                Some(Ok(Event::Open)) => {
                    debug!("Mistral stream opened");
                    continue;
                }
                Some(Ok(Event::Message(message))) => {
                    let data = message.data.trim();
                    if data == "[DONE]" {
                        source.close();
                        return None;
                    }
                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(chunk) => match chunk.choices.into_iter().next() {
                            Some(choice) => {
                                if let Some(reason) = &choice.finish_reason {
                                    debug!("Mistral stream finished: {}", reason);
                                }
                                return Some((Ok(choice.delta), Some(source)));
                            }
                            None => continue,
                        },
                        Err(e) => {
                            source.close();
                            let error = ModelError::MalformedResponse(format!(
                                "unreadable stream chunk: {}",
                                e
                            ));
                            return Some((Err(error), None));
                        }
                    }
                }
                Some(Err(SseError::StreamEnded)) | None => {
                    source.close();
                    return None;
                }
                Some(Err(e)) => {
                    source.close();
                    return Some((Err(map_sse_error(e).await), None));
                }
            }
        }
    })
    .boxed()
}

async fn map_sse_error(error: SseError) -> ModelError {
    match error {
        SseError::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            ModelError::from_status(status.as_u16(), crate::api_types::ApiError::describe(&body))
        }
        SseError::Transport(e) if e.is_timeout() => ModelError::Timeout,
        SseError::Transport(e) if e.is_connect() => ModelError::Network(e.to_string()),
        SseError::InvalidContentType(header, _) => ModelError::MalformedResponse(format!(
            "unexpected content type: {:?}",
            header
        )),
        other => ModelError::Stream(other.to_string()),
    }
}

/// A function call being assembled from stream fragments.
#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl PartialCall {
    fn absorb(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            self.id = Some(id);
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                self.name.push_str(&name);
            }
            match function.arguments {
                Some(Value::String(fragment)) => self.arguments.push_str(&fragment),
                Some(Value::Null) | None => {}
                Some(other) => self.arguments.push_str(&other.to_string()),
            }
        }
    }

    fn finish(self) -> Result<FunctionCall, ModelError> {
        let arguments = parse_arguments(&self.name, Value::String(self.arguments))?;
        Ok(FunctionCall {
            id: self.id,
            name: self.name,
            arguments,
        })
    }
}

/// Decide what a streamed response is by its first meaningful delta.
///
/// Text first: the rest of the stream is handed back as a [`TextStream`].
/// Function call first: the call is assembled from every delta and any text
/// alongside it is dropped.
pub(crate) async fn classify(mut deltas: DeltaStream) -> Result<ModelResponse, ModelError> {
    let mut calls: Vec<PartialCall> = Vec::new();

    while let Some(delta) = deltas.next().await {
        let delta = delta?;

        if let Some(tool_calls) = delta.tool_calls {
            for (position, call_delta) in tool_calls.into_iter().enumerate() {
                let index = call_delta.index.unwrap_or(position);
                while calls.len() <= index {
                    calls.push(PartialCall::default());
                }
                calls[index].absorb(call_delta);
            }
            continue;
        }

        let Some(content) = delta.content.filter(|c| !c.is_empty()) else {
            continue;
        };

        if calls.is_empty() {
            let first = stream::once(future::ready(Ok(content)));
            return Ok(ModelResponse::Text(first.chain(text_only(deltas)).boxed()));
        }

        debug!("Ignoring streamed text alongside a function call");
    }

    let mut calls = calls.into_iter().filter(|c| !c.name.is_empty());
    match calls.next() {
        Some(call) => {
            let extra = calls.count();
            if extra > 0 {
                warn!("Model requested {} extra function calls; using the first", extra);
            }
            Ok(ModelResponse::FunctionCall(call.finish()?))
        }
        None => Ok(ModelResponse::Text(assistant_core::text_stream::empty())),
    }
}

fn text_only(deltas: DeltaStream) -> TextStream {
    deltas
        .filter_map(|delta| {
            future::ready(match delta {
                Ok(delta) => delta.content.filter(|c| !c.is_empty()).map(Ok),
                Err(e) => Some(Err(e)),
            })
        })
        .boxed()
}
