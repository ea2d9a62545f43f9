// ABOUTME: Built-in code-execution tool backed by a sandbox session
// ABOUTME: Bridges tool-call payloads to the shared stateful interpreter

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use calq_sandbox::Session;

use crate::error::DispatchError;
use crate::tools::{ArgumentConvention, Tool, ToolPayload, ToolResult, ToolSpec};

const DESCRIPTION: &str = "Execute Python code in a Jupyter Notebook environment with basic \
dependencies installed. Please use this tool when some task can be done by executing code such \
as: perform arithmetic operations, perform data analysis, perform data visualization, etc.";

const CODE_PARAM_DESCRIPTION: &str =
    "The Python code to execute. It should be formatted as a valid Python script.";

/// Code-execution tool over one shared sandbox session.
///
/// The session sits behind a mutex: when a single model turn requests
/// several executions they serialize against each other, since they
/// mutate shared cumulative interpreter state, while unrelated tools in
/// the same turn still run in parallel.
pub struct CodeTool {
    session: Arc<Mutex<Session>>,
    name: String,
    convention: ArgumentConvention,
}

impl CodeTool {
    /// Standard registration: structured `{"code": ...}` arguments under
    /// the name `execute_code`.
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self {
            session,
            name: "execute_code".to_string(),
            convention: ArgumentConvention::Structured,
        }
    }

    /// Legacy registration for providers whose native code-interpreter
    /// tool is named `python` and passes the code itself as the whole
    /// argument payload.
    pub fn with_raw_arguments(session: Arc<Mutex<Session>>) -> Self {
        Self {
            session,
            name: "python".to_string(),
            convention: ArgumentConvention::RawString,
        }
    }
}

#[async_trait]
impl Tool for CodeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name.as_str(), DESCRIPTION).parameter(
            "code",
            "string",
            CODE_PARAM_DESCRIPTION,
            true,
        )
    }

    fn convention(&self) -> ArgumentConvention {
        self.convention
    }

    async fn invoke(&self, payload: ToolPayload) -> std::result::Result<ToolResult, DispatchError> {
        let code = payload.str_field("code")?;
        debug!("Running {}-byte code fragment in the sandbox", code.len());
        let record = self.session.lock().await.run(code).await;
        Ok(record.into())
    }
}
