//! Per-turn routing between direct answers and tool calls.

use std::future::Future;
use std::sync::Arc;

use agent_tools::{RegistryError, ToolErrorKind, ToolInvocation, ToolRegistry, ToolResult};
use assistant_core::{
    call_id_for, collect_text, hash_prompt, ChatMessage, ChatRequest, ConversationMemory,
    LanguageModel, ModelError, ModelResponse, Role, ToolChoice, Turn,
};
use futures::StreamExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::extract::{extract_tool_request, JsonReply};
use crate::prompts::{
    error_notice, fold_system_prompt, missing_argument_note, render_router_prompt,
    tool_indicator, unavailable_tool_note, DEGRADED_NOTE, EMPTY_RESPONSE_FALLBACK,
    GENERAL_KNOWLEDGE_PROMPT,
};
use crate::sink::ResponseSink;

/// What the model decided for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    /// Answer from general knowledge.
    DirectAnswer,
    /// Run this tool, then fold its result into the answer.
    ToolCall(ToolInvocation),
}

impl RoutingDecision {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, RoutingDecision::ToolCall(_))
    }
}

/// A routing decision plus any answer text the routing call already produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub decision: RoutingDecision,
    /// Non-empty free text from a direct answer.
    pub draft: Option<String>,
}

/// Which path produced a turn's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTaken {
    /// Answered from general knowledge as decided.
    Direct,
    /// Answered from a tool result (which may be a failure).
    Tool,
    /// Answered from general knowledge after routing or validation failed.
    Fallback,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An answer was shown and recorded as an assistant turn.
    Answered { text: String },
    /// A notice was shown; no assistant turn was recorded.
    Failed { notice: String },
}

impl TurnOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, TurnOutcome::Answered { .. })
    }

    /// The answer or the notice.
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Answered { text } => text,
            TurnOutcome::Failed { notice } => notice,
        }
    }
}

/// Everything that happened during one turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// `None` when the routing call itself failed.
    pub decision: Option<RoutingDecision>,
    pub route: RouteTaken,
    /// Set when a tool ran.
    pub tool_result: Option<ToolResult>,
    pub outcome: TurnOutcome,
    /// Errors handled along the way, in the order they happened.
    pub errors: Vec<RouterError>,
}

/// Routes each utterance to a direct answer or a tool, and streams the answer.
///
/// The router holds no conversation state; callers pass the memory in.
///
/// Tool-backed and fallback answers reach the sink fragment by fragment. A
/// direct answer does not: the routing call is non-streaming, and its text
/// is reused as the answer and delivered as a single fragment once the call
/// returns.
pub struct Router {
    model: Arc<dyn LanguageModel>,
    registry: Arc<ToolRegistry>,
    config: RouterConfig,
    system_prompt: String,
    prompt_hash: String,
}

impl Router {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<ToolRegistry>,
        config: RouterConfig,
    ) -> Self {
        let system_prompt =
            render_router_prompt(config.system_prompt.as_deref(), &registry.descriptors());
        let prompt_hash = hash_prompt(&system_prompt);

        info!(
            "Router initialized with model {} and tools [{}] (prompt hash: {})",
            model.name(),
            registry.list_tools().join(", "),
            prompt_hash
        );

        Self {
            model,
            registry,
            config,
            system_prompt,
            prompt_hash,
        }
    }

    /// The rendered routing system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// SHA-256 fingerprint of the routing system prompt.
    pub fn prompt_hash(&self) -> &str {
        &self.prompt_hash
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Decide how to handle `utterance` given the conversation so far.
    ///
    /// If the memory already ends with this utterance as a user turn, that
    /// turn is not sent twice.
    pub async fn decide(
        &self,
        memory: &ConversationMemory,
        utterance: &str,
    ) -> Result<Routed, RouterError> {
        let mut prior = memory.snapshot();
        if prior
            .last()
            .is_some_and(|turn| turn.role() == Role::User && turn.content() == utterance)
        {
            prior.pop();
        }
        self.decide_over(&prior, utterance).await
    }

    async fn decide_over(&self, prior: &[Turn], utterance: &str) -> Result<Routed, RouterError> {
        let mut messages = vec![ChatMessage::system(self.system_prompt.as_str())];
        messages.extend(history_messages(prior));
        messages.push(ChatMessage::user(utterance));

        debug!(
            "Routing request: {} messages, {} tools",
            messages.len(),
            self.registry.len()
        );

        let request = self.with_tools(ChatRequest::new(messages), ToolChoice::Auto);

        let routed = self
            .bounded(async {
                match self.model.complete(request).await? {
                    ModelResponse::FunctionCall(call) => Ok(Routed {
                        decision: RoutingDecision::ToolCall(call.into()),
                        draft: None,
                    }),
                    ModelResponse::Text(stream) => Ok(interpret_text(collect_text(stream).await?)),
                }
            })
            .await
            .map_err(RouterError::Decision)?;

        match &routed.decision {
            RoutingDecision::ToolCall(invocation) => info!(
                tool = %invocation.tool_name,
                params = invocation.arguments.len(),
                "Routing decision: tool call"
            ),
            RoutingDecision::DirectAnswer => info!(
                has_draft = routed.draft.is_some(),
                "Routing decision: direct answer"
            ),
        }

        Ok(routed)
    }

    /// Run one turn: record the utterance, route it, and stream the answer to `sink`.
    ///
    /// Always returns a report. The user turn is recorded first; an assistant
    /// turn is recorded only once a full answer exists.
    pub async fn process_turn(
        &self,
        memory: &mut ConversationMemory,
        utterance: &str,
        sink: &dyn ResponseSink,
    ) -> TurnReport {
        info!("Processing query ({} chars)", utterance.len());

        let prior = memory.snapshot();
        memory.add_user(utterance);

        let routed = match self.decide_over(&prior, utterance).await {
            Ok(routed) => routed,
            Err(e) => {
                warn!(error = %e, "ROUTING_DECISION_FAILED");
                sink.status(&format!("{}\n\n", DEGRADED_NOTE)).await;
                let mut report = self
                    .general_answer(memory, &prior, utterance, sink, None, RouteTaken::Fallback)
                    .await;
                report.errors.insert(0, e);
                return report;
            }
        };

        match routed.decision {
            RoutingDecision::ToolCall(invocation) => {
                self.run_tool(memory, &prior, utterance, invocation, sink)
                    .await
            }
            RoutingDecision::DirectAnswer => match routed.draft {
                Some(draft) => {
                    // Whole draft at once; see the type docs.
                    sink.fragment(&draft).await;
                    memory.add_assistant(draft.clone());
                    TurnReport {
                        decision: Some(RoutingDecision::DirectAnswer),
                        route: RouteTaken::Direct,
                        tool_result: None,
                        outcome: TurnOutcome::Answered { text: draft },
                        errors: Vec::new(),
                    }
                }
                None => {
                    debug!("Direct answer without draft, generating");
                    self.general_answer(
                        memory,
                        &prior,
                        utterance,
                        sink,
                        Some(RoutingDecision::DirectAnswer),
                        RouteTaken::Direct,
                    )
                    .await
                }
            },
        }
    }

    async fn run_tool(
        &self,
        memory: &mut ConversationMemory,
        prior: &[Turn],
        utterance: &str,
        invocation: ToolInvocation,
        sink: &dyn ResponseSink,
    ) -> TurnReport {
        let decision = Some(RoutingDecision::ToolCall(invocation.clone()));
        let tool_name = invocation.tool_name.clone();

        if let Err(e) = self.registry.validate(&invocation) {
            warn!(tool = %tool_name, error = %e, "TOOL_REQUEST_REJECTED");
            let note = match &e {
                RegistryError::MissingArgument { tool, argument } => {
                    missing_argument_note(tool, argument)
                }
                _ => unavailable_tool_note(&tool_name),
            };
            sink.status(&note).await;

            let mut report = self
                .general_answer(memory, prior, utterance, sink, decision, RouteTaken::Fallback)
                .await;
            report.errors.insert(0, RouterError::ToolValidation(e));
            return report;
        }

        sink.status(&tool_indicator(&tool_name)).await;
        let result = self.execute_tool(&invocation).await;
        memory.add_tool(tool_name.as_str(), result.to_fragment());

        let mut errors = Vec::new();
        if let ToolResult::Failure { kind, message } = &result {
            errors.push(RouterError::ToolExecution {
                tool: tool_name.clone(),
                kind: *kind,
                message: message.clone(),
            });
        }

        let call_id = invocation
            .call_id
            .clone()
            .unwrap_or_else(|| call_id_for(&format!("{}:{}", tool_name, utterance)));
        let mut call = invocation.to_function_call();
        call.id = Some(call_id.clone());

        let mut messages = vec![ChatMessage::system(fold_system_prompt(
            &tool_name, &result, utterance,
        ))];
        messages.extend(history_messages(prior));
        messages.push(ChatMessage::user(utterance));
        messages.push(ChatMessage::assistant_call(call));
        messages.push(ChatMessage::tool(
            tool_name.as_str(),
            call_id,
            result.to_fragment(),
        ));

        let request = self.with_tools(ChatRequest::new(messages), ToolChoice::None);
        let (outcome, error) = self.answer(memory, request, sink).await;
        errors.extend(error);

        TurnReport {
            decision,
            route: RouteTaken::Tool,
            tool_result: Some(result),
            outcome,
            errors,
        }
    }

    async fn execute_tool(&self, invocation: &ToolInvocation) -> ToolResult {
        match self.config.tool_timeout {
            Some(limit) => timeout(limit, self.registry.execute(invocation))
                .await
                .unwrap_or_else(|_| {
                    warn!(tool = %invocation.tool_name, "Tool execution timed out");
                    ToolResult::failure(ToolErrorKind::Timeout, "Tool execution timed out")
                }),
            None => self.registry.execute(invocation).await,
        }
    }

    /// Fresh streamed answer from general knowledge over the history.
    async fn general_answer(
        &self,
        memory: &mut ConversationMemory,
        prior: &[Turn],
        utterance: &str,
        sink: &dyn ResponseSink,
        decision: Option<RoutingDecision>,
        route: RouteTaken,
    ) -> TurnReport {
        let mut messages = vec![ChatMessage::system(GENERAL_KNOWLEDGE_PROMPT)];
        messages.extend(history_messages(prior));
        messages.push(ChatMessage::user(utterance));

        let (outcome, error) = self
            .answer(memory, ChatRequest::new(messages).streaming(true), sink)
            .await;

        TurnReport {
            decision,
            route,
            tool_result: None,
            outcome,
            errors: error.into_iter().collect(),
        }
    }

    /// Stream an answer and record it, or show a notice if generation fails.
    async fn answer(
        &self,
        memory: &mut ConversationMemory,
        request: ChatRequest,
        sink: &dyn ResponseSink,
    ) -> (TurnOutcome, Option<RouterError>) {
        match self.generate(request, sink).await {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    warn!("Model produced an empty answer");
                    sink.fragment(EMPTY_RESPONSE_FALLBACK).await;
                    EMPTY_RESPONSE_FALLBACK.to_string()
                } else {
                    text
                };
                debug!("Answer length: {} chars", text.len());
                memory.add_assistant(text.clone());
                (TurnOutcome::Answered { text }, None)
            }
            Err(e) => {
                warn!(error = %e, "GENERATION_FAILED");
                let notice = error_notice(&e);
                sink.error(&notice).await;
                (
                    TurnOutcome::Failed { notice },
                    Some(RouterError::Generation(e)),
                )
            }
        }
    }

    /// Drive a streamed generation once, forwarding every fragment to `sink`.
    ///
    /// The call timeout bounds opening the stream and each wait for a fragment.
    async fn generate(
        &self,
        request: ChatRequest,
        sink: &dyn ResponseSink,
    ) -> Result<String, ModelError> {
        let request = request.streaming(true);
        let mut stream = match self.bounded(self.model.complete(request)).await? {
            ModelResponse::Text(stream) => stream,
            ModelResponse::FunctionCall(call) => {
                return Err(ModelError::MalformedResponse(format!(
                    "unexpected function call '{}' while answering",
                    call.name
                )));
            }
        };

        let mut text = String::new();
        loop {
            let next = match self.config.call_timeout {
                Some(limit) => timeout(limit, stream.next())
                    .await
                    .map_err(|_| ModelError::Timeout)?,
                None => stream.next().await,
            };
            let Some(fragment) = next else {
                break;
            };
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            sink.fragment(&fragment).await;
            text.push_str(&fragment);
        }

        Ok(text)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ModelError>
    where
        F: Future<Output = Result<T, ModelError>>,
    {
        match self.config.call_timeout {
            Some(limit) => timeout(limit, call)
                .await
                .unwrap_or(Err(ModelError::Timeout)),
            None => call.await,
        }
    }

    fn with_tools(&self, request: ChatRequest, choice: ToolChoice) -> ChatRequest {
        if self.registry.is_empty() {
            request
        } else {
            request
                .with_tools(self.registry.descriptors())
                .with_tool_choice(choice)
        }
    }
}

/// Prior user and assistant turns as chat messages. Tool turns are not replayed.
fn history_messages(prior: &[Turn]) -> impl Iterator<Item = ChatMessage> + '_ {
    prior
        .iter()
        .filter(|turn| matches!(turn.role(), Role::User | Role::Assistant))
        .map(ChatMessage::from)
}

fn interpret_text(text: String) -> Routed {
    match extract_tool_request(&text) {
        Some(JsonReply::Tool(invocation)) => Routed {
            decision: RoutingDecision::ToolCall(invocation),
            draft: None,
        },
        Some(JsonReply::NoTool) => Routed {
            decision: RoutingDecision::DirectAnswer,
            draft: None,
        },
        None => {
            let draft = text.trim();
            Routed {
                decision: RoutingDecision::DirectAnswer,
                draft: (!draft.is_empty()).then(|| draft.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_plain_text() {
        let routed = interpret_text("  The capital of France is Paris.\n".to_string());
        assert_eq!(routed.decision, RoutingDecision::DirectAnswer);
        assert_eq!(routed.draft.as_deref(), Some("The capital of France is Paris."));
    }

    #[test]
    fn test_interpret_json_request() {
        let routed = interpret_text(
            r#"```json
{"use_tool": true, "tool_name": "get_weather", "tool_parameters": {"location": "Delhi"}}
```"#
                .to_string(),
        );
        let RoutingDecision::ToolCall(invocation) = routed.decision else {
            panic!("expected tool call");
        };
        assert_eq!(invocation.tool_name, "get_weather");
        assert_eq!(invocation.arguments["location"], "Delhi");
        assert!(routed.draft.is_none());
    }

    #[test]
    fn test_interpret_empty_and_declined() {
        assert_eq!(interpret_text("   ".to_string()).draft, None);
        let routed = interpret_text(r#"{"use_tool": false}"#.to_string());
        assert_eq!(routed.decision, RoutingDecision::DirectAnswer);
        assert!(routed.draft.is_none());
    }

    #[test]
    fn test_history_skips_tool_turns() {
        let prior = vec![
            Turn::user("Weather in Delhi?"),
            Turn::tool("get_weather", r#"{"status":"success"}"#),
            Turn::assistant("It is 31°C."),
        ];
        let messages: Vec<_> = history_messages(&prior).collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_turn_outcome_text() {
        let answered = TurnOutcome::Answered {
            text: "Paris".to_string(),
        };
        assert!(answered.is_answered());
        assert_eq!(answered.text(), "Paris");
        assert!(!TurnOutcome::Failed {
            notice: "I encountered an error: x".to_string()
        }
        .is_answered());
    }
}
