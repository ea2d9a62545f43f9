// ABOUTME: Interpreter child process bridge for sandbox sessions
// ABOUTME: Manages newline-delimited JSON IPC with the embedded Python driver over stdin/stdout

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SandboxError};
use crate::types::{DisplayData, ExecutionRecord};

/// Driver program executed inside the interpreter child process
const DRIVER_SOURCE: &str = include_str!("driver.py");

/// Bound on how long the child may take to report readiness
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// IPC request types sent to the driver
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DriverRequest<'a> {
    Execute { code: &'a str },
    Shutdown,
}

/// IPC response types received from the driver
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DriverResponse {
    Ready,
    Result {
        output: String,
        #[serde(default)]
        display_data: Vec<DisplayData>,
        error: Option<String>,
    },
}

/// Handle to one running interpreter child process
pub(crate) struct Interpreter {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl Interpreter {
    /// Spawn the interpreter and wait for the driver's ready handshake
    pub(crate) async fn spawn(config: &SessionConfig) -> Result<Self> {
        debug!("Spawning interpreter: {}", config.interpreter);

        let mut command = Command::new(&config.interpreter);
        command
            .arg("-u")
            .arg("-c")
            .arg(DRIVER_SOURCE)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| SandboxError::SpawnFailed(format!("{}: {}", config.interpreter, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SandboxError::SpawnFailed("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::SpawnFailed("failed to capture stdout".to_string()))?;

        let mut interpreter = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        match tokio::time::timeout(STARTUP_TIMEOUT, interpreter.read_response()).await {
            Ok(Ok(DriverResponse::Ready)) => {
                debug!("Interpreter is ready");
                Ok(interpreter)
            }
            Ok(Ok(_)) => Err(SandboxError::Protocol(
                "unexpected response while waiting for ready".to_string(),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SandboxError::SpawnFailed(
                "timeout waiting for interpreter to become ready".to_string(),
            )),
        }
    }

    /// Execute one code fragment within the given wall-clock bound.
    ///
    /// On timeout the child is killed and `SandboxError::Timeout` is
    /// returned; the caller is responsible for respawning.
    pub(crate) async fn execute(
        &mut self,
        code: &str,
        timeout: Duration,
    ) -> Result<ExecutionRecord> {
        self.send(&DriverRequest::Execute { code }).await?;

        match tokio::time::timeout(timeout, self.read_response()).await {
            Ok(Ok(DriverResponse::Result {
                output,
                display_data,
                error,
            })) => Ok(ExecutionRecord {
                output,
                display_data,
                error,
            }),
            Ok(Ok(DriverResponse::Ready)) => Err(SandboxError::Protocol(
                "unexpected ready response during execution".to_string(),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!("Execution exceeded {}s, killing interpreter", timeout.as_secs());
                self.kill().await;
                Err(SandboxError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        }
    }

    /// Ask the driver to exit, then make sure the process is gone
    pub(crate) async fn shutdown(mut self) {
        if self.send(&DriverRequest::Shutdown).await.is_ok() {
            let _ = tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await;
        }
        self.kill().await;
    }

    /// Send a request line to the driver via stdin
    async fn send(&mut self, request: &DriverRequest<'_>) -> Result<()> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read the next protocol line from the driver's stdout
    async fn read_response(&mut self) -> Result<DriverResponse> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or(SandboxError::InterpreterExited)?;
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line)
                .map_err(|e| SandboxError::Protocol(format!("{} - line: {}", e, line)));
        }
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("Failed to kill interpreter process: {}", e);
        }
    }
}
