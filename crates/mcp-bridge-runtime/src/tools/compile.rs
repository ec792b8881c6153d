use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::lockfile::{LockKind, PresenceLock};
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompileInput {
    #[serde(rename = "ForceRecompile", default)]
    pub force_recompile: bool,
    #[serde(rename = "WaitForReset", default)]
    pub wait_for_reset: bool,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CompileOutput {
    pub result: serde_json::Value,
}

/// §4.6 "Long-running compile contract": when `wait_for_reset` is set,
/// the handler's at-most-once post-condition is writing
/// `Temp/compile-result-<id>.json`; a second call with the same id is a
/// no-op.
pub struct CompileTool {
    host: Arc<dyn EditorHost>,
    project_root: PathBuf,
}

impl CompileTool {
    pub fn new(host: Arc<dyn EditorHost>, project_root: PathBuf) -> Self {
        Self { host, project_root }
    }

    fn result_path(&self, request_id: &str) -> PathBuf {
        self.project_root
            .join("Temp")
            .join(format!("compile-result-{}.json", request_id))
    }
}

#[async_trait]
impl Tool for CompileTool {
    type Input = CompileInput;
    type Output = CompileOutput;
    type Error = Error;

    fn name() -> &'static str {
        "compile"
    }

    fn description() -> &'static str {
        "Triggers a project compile, optionally waiting across an environment reset."
    }

    fn editor_thread_only() -> bool {
        true
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        // Presence-flag only; a failure to create it is not fatal to the
        // compile itself.
        let _lock = PresenceLock::acquire(&self.project_root, LockKind::Compiling).ok();
        let result = self.host.compile(input.force_recompile).await?;

        if input.wait_for_reset {
            if let Some(request_id) = &input.request_id {
                let path = self.result_path(request_id);
                if !path.exists() {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).map_err(Error::Io)?;
                    }
                    let bytes = serde_json::to_vec_pretty(&result).map_err(Error::Serialization)?;
                    std::fs::write(&path, bytes).map_err(Error::Io)?;
                }
            }
        }

        Ok(CompileOutput { result })
    }
}
