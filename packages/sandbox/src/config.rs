// ABOUTME: Session configuration for sandbox execution
// ABOUTME: Interpreter selection, execution timeout, and working directory with env overrides

use std::path::PathBuf;
use std::time::Duration;

/// Default interpreter program; must speak the driver protocol
const DEFAULT_INTERPRETER: &str = "python3";

/// Default wall-clock bound for a single code submission
const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Configuration for a sandbox session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interpreter program to run (e.g. `python3`)
    pub interpreter: String,
    /// Hard wall-clock timeout per code submission
    pub timeout: Duration,
    /// Working directory for the interpreter process
    pub workdir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            workdir: None,
        }
    }
}

impl SessionConfig {
    /// Build a config from defaults plus environment overrides.
    ///
    /// `CALQ_SANDBOX_INTERPRETER` selects the interpreter program and
    /// `CALQ_SANDBOX_TIMEOUT_SECONDS` (1..=86400) the per-submission
    /// timeout.
    pub fn from_env() -> Self {
        let interpreter = std::env::var("CALQ_SANDBOX_INTERPRETER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string());

        let timeout_seconds = std::env::var("CALQ_SANDBOX_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| (1..=86_400).contains(&v))
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        Self {
            interpreter,
            timeout: Duration::from_secs(timeout_seconds),
            workdir: None,
        }
    }

    /// Override the per-submission timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the interpreter working directory
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }
}
