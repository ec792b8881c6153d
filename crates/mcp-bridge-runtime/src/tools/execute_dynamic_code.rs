use async_trait::async_trait;
use mcp_bridge_config::SandboxLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::sandbox::{self, Violation};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteDynamicCodeInput {
    #[serde(rename = "Code")]
    pub code: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExecuteDynamicCodeOutput {
    pub result: serde_json::Value,
}

/// §4.9: level-gated. `Disabled` never executes; `Restricted` walks the
/// AST and refuses on any violation; `FullAccess` skips the walk.
pub struct ExecuteDynamicCodeTool {
    host: Arc<dyn EditorHost>,
    level: SandboxLevel,
}

impl ExecuteDynamicCodeTool {
    pub fn new(host: Arc<dyn EditorHost>, level: SandboxLevel) -> Self {
        Self { host, level }
    }
}

#[async_trait]
impl Tool for ExecuteDynamicCodeTool {
    type Input = ExecuteDynamicCodeInput;
    type Output = ExecuteDynamicCodeOutput;
    type Error = Error;

    fn name() -> &'static str {
        "execute-dynamic-code"
    }

    fn description() -> &'static str {
        "Compiles and runs an ad-hoc source snippet under the configured sandbox level."
    }

    fn editor_thread_only() -> bool {
        true
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        if !sandbox::can_execute(self.level) {
            return Err(Error::SecurityBlocked {
                command: "execute-dynamic-code".to_string(),
                reason: "dynamic code execution is disabled".to_string(),
                violations: Vec::new(),
            });
        }

        let violations: Vec<Violation> = sandbox::check_source(&input.code, self.level)?;
        if !violations.is_empty() {
            return Err(Error::SecurityBlocked {
                command: "execute-dynamic-code".to_string(),
                reason: "source contains forbidden constructs under the restricted sandbox".to_string(),
                violations,
            });
        }

        let result = self
            .host
            .run_on_main_thread(Box::new(|| Ok(serde_json::json!({ "ran": true }))))
            .await?;
        Ok(ExecuteDynamicCodeOutput { result })
    }
}
