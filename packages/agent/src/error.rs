// ABOUTME: Error types for the tool-calling orchestrator
// ABOUTME: Separates conversation-fatal provider failures from recoverable dispatch failures

use thiserror::Error;

/// Failures reported by the model client collaborator. These terminate
/// the conversation; the orchestrator does not retry.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Request never produced a response (network, connect, transport)
    #[error("request failed: {0}")]
    Request(String),

    /// Provider returned an error response (auth, rate limit, bad input)
    #[error("provider returned error: {0}")]
    Api(String),

    /// Model call exceeded its wall-clock bound
    #[error("model call timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

/// Failures while routing one tool-call request to a tool
/// implementation. These never terminate the loop: they are serialized
/// into an error ToolResult so the model can correct itself.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request names a tool absent from the catalog
    #[error("tool not found: {0}")]
    UnknownTool(String),

    /// A required argument is missing or has the wrong type
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// The argument payload could not be parsed for the tool's convention
    #[error("malformed tool arguments: {0}")]
    MalformedArguments(String),
}

/// Main error type for conversation runs
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model client failed; the conversation cannot continue
    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model kept requesting tools past the configured turn bound
    #[error("Turn limit of {0} reached without a final answer")]
    TurnLimit(usize),
}

/// Type alias for Results that return AgentError
pub type Result<T> = std::result::Result<T, AgentError>;
