// ABOUTME: Error types for sandbox sessions
// ABOUTME: Covers interpreter process failures, protocol breakdowns, and execution timeouts

use thiserror::Error;

/// Main error type for sandbox operations
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Interpreter program could not be spawned
    #[error("Interpreter failed to start: {0}")]
    SpawnFailed(String),

    /// Interpreter process exited or closed its pipes unexpectedly
    #[error("Interpreter exited unexpectedly")]
    InterpreterExited,

    /// Interpreter sent a line the protocol cannot parse
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Execution exceeded the configured wall-clock bound
    #[error("Execution timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Error-kind tag used when a failure is folded into an
    /// [`ExecutionRecord`](crate::types::ExecutionRecord).
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            SandboxError::Timeout { .. } => "TimeoutError",
            _ => "InterpreterError",
        }
    }
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
