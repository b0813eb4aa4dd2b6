//! MistralBrain implementation using the Mistral chat-completions API.

use assistant_core::{
    async_trait, text_stream, ChatRequest, LanguageModel, ModelError, ModelResponse,
};
use reqwest::Client;
use reqwest_eventsource::{retry, EventSource};
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, WireMessage, WireTool};
use crate::config::MistralConfig;
use crate::stream::{classify, delta_stream};

/// A language-model backend that talks to Mistral.
///
/// Stateless: every call carries its full message list, so one instance can
/// serve routing, folding and fallback generation alike.
pub struct MistralBrain {
    client: Client,
    config: MistralConfig,
}

impl MistralBrain {
    /// Create a new MistralBrain with the given configuration.
    pub fn new(config: MistralConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Configuration("Mistral API key is empty".to_string()));
        }

        // No overall timeout: it would also cut off long streams. The read
        // timeout bounds each wait for bytes, so a stalled stream still ends.
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "MistralBrain initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Create a MistralBrain from environment variables.
    ///
    /// See [`MistralConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::new(MistralConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &MistralConfig {
        &self.config
    }

    fn build_request(&self, request: &ChatRequest) -> ChatCompletionRequest {
        let (tools, tool_choice) = if request.tools.is_empty() {
            (None, None)
        } else {
            (
                Some(request.tools.iter().map(WireTool::from).collect()),
                Some(request.tool_choice),
            )
        };

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: request.stream,
            tools,
            tool_choice,
        }
    }

    /// Make a blocking chat completion request.
    async fn chat_completion(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ModelError> {
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::from_status(
                status.as_u16(),
                ApiError::describe(&error_text),
            ));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ModelError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }

    async fn complete_blocking(
        &self,
        body: ChatCompletionRequest,
    ) -> Result<ModelResponse, ModelError> {
        let completion = self.chat_completion(&body).await?;

        let ChatCompletionResponse { id, model, choices, .. } = completion;
        let choice = choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::MalformedResponse("response has no choices".to_string()))?;

        debug!(
            "Completion {} from {} finished: {}",
            id.as_deref().unwrap_or("-"),
            model.as_deref().unwrap_or("-"),
            choice.finish_reason.as_deref().unwrap_or("unknown")
        );

        let content = choice.message.content.filter(|c| !c.trim().is_empty());
        let mut calls = choice.message.tool_calls.unwrap_or_default().into_iter();

        if let Some(call) = calls.next() {
            if calls.len() > 0 {
                warn!("Model requested {} extra function calls; using the first", calls.len());
            }
            if content.is_some() {
                debug!("Response carries text and a function call; the call wins");
            }
            return Ok(ModelResponse::FunctionCall(call.into_function_call()?));
        }

        Ok(ModelResponse::Text(match content {
            Some(text) => text_stream::once(text),
            None => text_stream::empty(),
        }))
    }

    async fn complete_streaming(
        &self,
        body: ChatCompletionRequest,
    ) -> Result<ModelResponse, ModelError> {
        let builder = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let mut source = EventSource::new(builder)
            .map_err(|e| ModelError::Configuration(format!("Cannot open stream: {}", e)))?;
        source.set_retry_policy(Box::new(retry::Never));

        classify(delta_stream(source)).await
    }
}

fn map_transport_error(error: reqwest::Error) -> ModelError {
    if error.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Network(format!("Failed to send request: {}", error))
    }
}

#[async_trait]
impl LanguageModel for MistralBrain {
    async fn complete(&self, request: ChatRequest) -> Result<ModelResponse, ModelError> {
        let body = self.build_request(&request);
        debug!(
            "Sending {} messages to Mistral (tools: {}, stream: {})",
            body.messages.len(),
            request.tools.len(),
            body.stream
        );

        if body.stream {
            self.complete_streaming(body).await
        } else {
            self.complete_blocking(body).await
        }
    }

    fn name(&self) -> &str {
        "MistralBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_core::{collect_text, ChatMessage, ParameterSpec, ToolChoice, ToolDescriptor};
    use indexmap::IndexMap;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn brain_for(server: &MockServer) -> MistralBrain {
        let config = MistralConfig::builder()
            .api_key("test-key")
            .api_url(server.uri())
            .build();
        MistralBrain::new(config).unwrap()
    }

    fn weather_descriptor() -> ToolDescriptor {
        let mut params = IndexMap::new();
        params.insert("location".to_string(), ParameterSpec::required_string("City"));
        ToolDescriptor::new("get_weather", "Current weather", params)
    }

    fn sse(events: &[serde_json::Value]) -> String {
        let mut body = String::new();
        for event in events {
            body.push_str(&format!("data: {}\n\n", event));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[test]
    fn test_brain_name() {
        let config = MistralConfig::builder().api_key("test-key").build();
        let brain = MistralBrain::new(config).unwrap();
        assert_eq!(brain.name(), "MistralBrain");
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = MistralBrain::new(MistralConfig::default());
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_build_request_omits_tools_when_none() {
        let config = MistralConfig::builder().api_key("k").build();
        let brain = MistralBrain::new(config).unwrap();

        let body = brain.build_request(&ChatRequest::new(vec![ChatMessage::user("hi")]));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
        assert_eq!(value["model"], "mistral-small-latest");
        assert_eq!(value["stream"], false);
    }

    #[tokio::test]
    async fn test_blocking_text_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"stream": false, "tool_choice": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "model": "mistral-small-latest",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "The capital of France is Paris."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("What is the capital of France?")])
            .with_tools(vec![weather_descriptor()])
            .with_tool_choice(ToolChoice::Auto);
        let response = brain_for(&server).complete(request).await.unwrap();

        let ModelResponse::Text(stream) = response else {
            panic!("expected text");
        };
        assert_eq!(
            collect_text(stream).await.unwrap(),
            "The capital of France is Paris."
        );
    }

    #[tokio::test]
    async fn test_blocking_function_call_wins_over_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "Let me look that up.",
                        "tool_calls": [{
                            "id": "D681PevKs",
                            "type": "function",
                            "function": {"name": "get_weather", "arguments": "{\"location\": \"Delhi\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("What is the weather in Delhi")])
            .with_tools(vec![weather_descriptor()]);
        let response = brain_for(&server).complete(request).await.unwrap();

        let ModelResponse::FunctionCall(call) = response else {
            panic!("expected function call");
        };
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.id.as_deref(), Some("D681PevKs"));
        assert_eq!(call.arguments["location"], "Delhi");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({"message": "Requests rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let result = brain_for(&server)
            .complete(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await;
        match result {
            Err(ModelError::RateLimited(msg)) => assert!(msg.contains("rate limit")),
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let result = brain_for(&server)
            .complete(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await;
        assert!(matches!(
            result,
            Err(ModelError::Api { status: 401, ref message }) if message == "Unauthorized"
        ));
    }

    #[tokio::test]
    async fn test_streaming_text() {
        let server = MockServer::start().await;
        let body = sse(&[
            json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]}),
            json!({"choices": [{"index": 0, "delta": {"content": "Apple is trading"}}]}),
            json!({"choices": [{"index": 0, "delta": {"content": " at $189.50."}, "finish_reason": "stop"}]}),
        ]);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let request =
            ChatRequest::new(vec![ChatMessage::user("How is Apple stock doing?")]).streaming(true);
        let response = brain_for(&server).complete(request).await.unwrap();

        let ModelResponse::Text(stream) = response else {
            panic!("expected text");
        };
        assert_eq!(
            collect_text(stream).await.unwrap(),
            "Apple is trading at $189.50."
        );
    }

    #[tokio::test]
    async fn test_streaming_function_call() {
        let server = MockServer::start().await;
        let body = sse(&[json!({"choices": [{"index": 0, "delta": {
            "content": "",
            "tool_calls": [{"id": "x9y8z7w6v", "function": {"name": "get_stock_price", "arguments": "{\"symbol\": \"AAPL\"}"}}]
        }, "finish_reason": "tool_calls"}]})]);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("How is Apple stock doing?")])
            .with_tools(vec![weather_descriptor()])
            .streaming(true);
        let response = brain_for(&server).complete(request).await.unwrap();

        let ModelResponse::FunctionCall(call) = response else {
            panic!("expected function call");
        };
        assert_eq!(call.name, "get_stock_price");
        assert_eq!(call.arguments["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_streaming_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"message": "Service unavailable"})),
            )
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).streaming(true);
        let result = brain_for(&server).complete(request).await;
        assert!(matches!(result, Err(ModelError::Api { status: 503, .. })));
    }

    fn slow_brain_for(server: &MockServer) -> MistralBrain {
        let config = MistralConfig::builder()
            .api_key("test-key")
            .api_url(server.uri())
            .timeout(Duration::from_secs(1))
            .build();
        MistralBrain::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let server = MockServer::start().await;
        let body = sse(&[json!({"choices": [{"index": 0, "delta": {"content": "Too late"}}]})]);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/event-stream")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).streaming(true);
        let started = Instant::now();
        let result = slow_brain_for(&server).complete(request).await;

        assert!(matches!(result, Err(ModelError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_stalled_blocking_call_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "Too late"}}]}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        let started = Instant::now();
        let result = slow_brain_for(&server).complete(request).await;

        assert!(matches!(result, Err(ModelError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
