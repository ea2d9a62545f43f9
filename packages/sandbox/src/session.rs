// ABOUTME: Cumulative execution sessions over a persistent interpreter process
// ABOUTME: Appends code submissions as cells and normalizes every outcome into an ExecutionRecord

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Result, SandboxError};
use crate::interpreter::Interpreter;
use crate::types::{Cell, ExecutionRecord};

/// One stateful execution session.
///
/// Names, imports, and other side effects of each submission remain
/// visible to all subsequent submissions. The session is created empty
/// and spawns its interpreter process lazily on the first `run`, so
/// construction itself cannot fail.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    cells: Vec<Cell>,
    interpreter: Option<Interpreter>,
}

impl Session {
    /// Create a fresh, empty session
    pub fn new(config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        debug!("Created sandbox session {}", id);
        Self {
            id,
            config,
            cells: Vec::new(),
            interpreter: None,
        }
    }

    /// Session identifier, for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Executed-cell history, oldest first
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Execute a code fragment against the session's cumulative state.
    ///
    /// Never fails outward: syntax errors, runtime exceptions, timeouts,
    /// and interpreter failures are all reported through
    /// [`ExecutionRecord::error`] and leave the session usable for the
    /// next submission.
    pub async fn run(&mut self, code: impl Into<String>) -> ExecutionRecord {
        let code = code.into();
        debug!("Session {} executing fragment ({} bytes)", self.id, code.len());

        let record = match self.execute(&code).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Session {} execution failed outside user code: {}", self.id, e);
                // The interpreter is gone or unreliable; the next run
                // respawns it and replays prior successful cells.
                self.interpreter = None;
                ExecutionRecord::from_failure(&e)
            }
        };

        self.cells.push(Cell {
            code,
            record: record.clone(),
            executed_at: Utc::now(),
        });
        record
    }

    /// Tear down the interpreter process. The cell history survives and
    /// a later `run` transparently restores the cumulative state.
    pub async fn shutdown(&mut self) {
        if let Some(interpreter) = self.interpreter.take() {
            info!("Shutting down interpreter for session {}", self.id);
            interpreter.shutdown().await;
        }
    }

    async fn execute(&mut self, code: &str) -> Result<ExecutionRecord> {
        if self.interpreter.is_none() {
            self.restore().await?;
        }
        let timeout = self.config.timeout;
        self.interpreter
            .as_mut()
            .ok_or(SandboxError::InterpreterExited)?
            .execute(code, timeout)
            .await
    }

    /// Spawn a fresh interpreter and replay previously successful cells
    /// to rebuild the cumulative namespace. Failed cells stay in the
    /// history for audit but are not re-executed.
    async fn restore(&mut self) -> Result<()> {
        let mut interpreter = Interpreter::spawn(&self.config).await?;

        let replay_count = self.cells.iter().filter(|c| c.record.is_success()).count();
        if replay_count > 0 {
            info!(
                "Session {} restoring state by replaying {} cells",
                self.id, replay_count
            );
        }
        for cell in self.cells.iter().filter(|c| c.record.is_success()) {
            let record = interpreter.execute(&cell.code, self.config.timeout).await?;
            if let Some(error) = record.error {
                warn!("Session {} replayed cell failed unexpectedly: {}", self.id, error);
            }
        }

        self.interpreter = Some(interpreter);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
