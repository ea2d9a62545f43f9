// ABOUTME: Model client collaborator boundary
// ABOUTME: Opaque RPC trait producing one assistant message per model turn

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::tools::ToolSpec;
use crate::transcript::Message;

/// Whether the model may choose to call tools on this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
}

/// Opaque RPC to a chat-completions model provider.
///
/// Implementations own authentication, base-URL and model selection;
/// the orchestrator only sends the transcript plus the tool catalog and
/// receives one assistant message, possibly carrying tool calls.
/// Failures are fatal to the conversation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
        temperature: f32,
    ) -> std::result::Result<Message, ProviderError>;
}
