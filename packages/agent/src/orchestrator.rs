// ABOUTME: Tool-calling conversation loop
// ABOUTME: Drives model turns, dispatches tool calls, and appends results until a final answer

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::client::{ModelClient, ToolChoice};
use crate::error::{AgentError, DispatchError, ProviderError, Result};
use crate::registry::ToolRegistry;
use crate::tools::{ArgumentConvention, ToolPayload, ToolResult};
use crate::transcript::{Message, ToolCall, Transcript};

const DEFAULT_MAX_TURNS: usize = 32;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MODEL_TIMEOUT_SECONDS: u64 = 600;

/// Configuration for one conversation run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on model turns before the run is aborted
    pub max_turns: usize,
    /// Sampling temperature when no tools are registered. With a
    /// non-empty catalog the loop forces 0.0 so tool selection stays
    /// deterministic.
    pub temperature: f32,
    /// Wall-clock bound on each model call
    pub model_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            temperature: DEFAULT_TEMPERATURE,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECONDS),
        }
    }
}

impl OrchestratorConfig {
    /// Defaults plus environment overrides. `CALQ_MAX_TURNS` (1..=1000)
    /// bounds the number of model turns per conversation.
    pub fn from_env() -> Self {
        let max_turns = std::env::var("CALQ_MAX_TURNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&v| (1..=1000).contains(&v))
            .unwrap_or(DEFAULT_MAX_TURNS);

        Self {
            max_turns,
            ..Self::default()
        }
    }
}

/// Loop state for one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModel,
    DispatchingTools,
    Done,
}

/// Completed conversation: the final answer plus the full transcript
#[derive(Debug)]
pub struct ConversationOutcome {
    pub final_answer: String,
    pub transcript: Vec<Message>,
    /// Model turns consumed, including the final one
    pub turns: usize,
}

/// Drives the request/response cycle with the model until a final
/// answer is reached.
///
/// The orchestrator exclusively owns the transcript: every assistant
/// message is appended before its tool calls are dispatched, every tool
/// call is answered by exactly one tool message, and tool messages land
/// in request order.
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    registry: ToolRegistry,
    config: OrchestratorConfig,
    state: TurnState,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ModelClient>, registry: ToolRegistry) -> Self {
        Self::with_config(client, registry, OrchestratorConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn ModelClient>,
        registry: ToolRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
            state: TurnState::AwaitingModel,
        }
    }

    /// Current loop state
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Run the conversation to completion, starting from the seed
    /// messages (typically an optional system message plus the user
    /// message).
    ///
    /// Returns when the model answers without tool calls, or with an
    /// error when the provider fails or the turn bound is exceeded.
    pub async fn run(mut self, initial: Vec<Message>) -> Result<ConversationOutcome> {
        let mut transcript = Transcript::seeded(initial);
        let catalog = self.registry.specs();
        let temperature = if catalog.is_empty() {
            self.config.temperature
        } else {
            0.0
        };

        for turn in 1..=self.config.max_turns {
            self.state = TurnState::AwaitingModel;
            debug!("Requesting model turn {} ({} messages)", turn, transcript.len());

            let completion = tokio::time::timeout(
                self.config.model_timeout,
                self.client
                    .complete(transcript.messages(), &catalog, ToolChoice::Auto, temperature),
            )
            .await;
            let assistant = match completion {
                Ok(result) => result?,
                Err(_) => {
                    return Err(AgentError::Provider(ProviderError::Timeout {
                        seconds: self.config.model_timeout.as_secs(),
                    }))
                }
            };

            let tool_calls = assistant.tool_calls.clone();
            transcript.push(assistant.clone());

            if tool_calls.is_empty() {
                self.state = TurnState::Done;
                info!("Conversation finished after {} turns", turn);
                return Ok(ConversationOutcome {
                    final_answer: assistant.content.unwrap_or_default(),
                    transcript: transcript.into_messages(),
                    turns: turn,
                });
            }

            self.state = TurnState::DispatchingTools;
            info!("Dispatching {} tool calls", tool_calls.len());

            // Independent tools may run concurrently; join_all yields
            // results in request order, so the transcript never depends
            // on completion order.
            let results = join_all(tool_calls.iter().map(|call| self.dispatch(call))).await;
            for (call, result) in tool_calls.iter().zip(results) {
                transcript.push(Message::tool(
                    call.id.clone(),
                    call.function.name.clone(),
                    result.to_wire(),
                ));
            }
        }

        warn!(
            "Turn limit of {} reached without a final answer",
            self.config.max_turns
        );
        Err(AgentError::TurnLimit(self.config.max_turns))
    }

    /// Route one tool-call request to its implementation. Every failure
    /// mode becomes an error ToolResult so the loop keeps moving.
    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let name = &call.function.name;
        let Some(tool) = self.registry.get(name) else {
            warn!("Tool call {} names unregistered tool '{}'", call.id, name);
            return ToolResult::from_error(
                "DispatchError",
                DispatchError::UnknownTool(name.clone()),
            );
        };

        let payload = match tool.convention() {
            ArgumentConvention::RawString => ToolPayload::Raw(call.function.arguments.clone()),
            ArgumentConvention::Structured => {
                match serde_json::from_str(&call.function.arguments) {
                    Ok(map) => ToolPayload::Structured(map),
                    Err(e) => {
                        warn!("Tool call {} has malformed arguments: {}", call.id, e);
                        return ToolResult::from_error(
                            "DispatchError",
                            DispatchError::MalformedArguments(e.to_string()),
                        );
                    }
                }
            }
        };

        debug!("Invoking tool '{}' for call {}", name, call.id);
        match tool.invoke(payload).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool '{}' rejected call {}: {}", name, call.id, e);
                ToolResult::from_error("DispatchError", e)
            }
        }
    }
}
