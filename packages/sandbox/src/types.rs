// ABOUTME: Core type definitions for sandbox execution
// ABOUTME: Defines the normalized execution record and the per-submission cell history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;

/// Rich display artifact emitted by a code fragment: an opaque mapping
/// from a media-type tag (e.g. `image/png`, `text/html`) to its payload.
pub type DisplayData = serde_json::Map<String, serde_json::Value>;

/// Normalized result of executing one code fragment.
///
/// Exactly this shape is serialized back to the model, regardless of
/// which output channel the fragment used: printed text, a trailing
/// expression value, rich display artifacts, or a raised error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Accumulated stdout/stderr text, or the textual representation of
    /// the fragment's trailing expression value
    pub output: String,
    /// Rich display artifacts in emission order
    pub display_data: Vec<DisplayData>,
    /// Error descriptor formatted as `<ErrorKind>: <message>`, if the
    /// fragment failed
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// Build a record for a failure that happened outside user code
    /// (spawn failure, protocol breakdown, timeout). Partial output from
    /// inside user code is captured by the driver, so there is none here.
    pub(crate) fn from_failure(error: &SandboxError) -> Self {
        Self {
            output: String::new(),
            display_data: Vec::new(),
            error: Some(format!("{}: {}", error.kind(), error)),
        }
    }

    /// True when the fragment completed without raising
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One executed code submission, retained for audit/debugging and for
/// state restoration when the interpreter process has to be respawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The submitted code fragment
    pub code: String,
    /// Normalized output of the fragment
    pub record: ExecutionRecord,
    /// When the fragment finished executing
    pub executed_at: DateTime<Utc>,
}
