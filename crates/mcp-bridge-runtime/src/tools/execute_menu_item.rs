use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteMenuItemInput {
    #[serde(rename = "Path")]
    pub path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExecuteMenuItemOutput {
    pub ack: bool,
}

/// Gated by `allow_menu_execution` (§5, §6).
pub struct ExecuteMenuItemTool {
    host: Arc<dyn EditorHost>,
}

impl ExecuteMenuItemTool {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for ExecuteMenuItemTool {
    type Input = ExecuteMenuItemInput;
    type Output = ExecuteMenuItemOutput;
    type Error = Error;

    fn name() -> &'static str {
        "execute-menu-item"
    }

    fn description() -> &'static str {
        "Invokes a named menu command in the host editor."
    }

    fn security_requirement() -> Option<&'static str> {
        Some("allow_menu_execution")
    }

    fn editor_thread_only() -> bool {
        true
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        self.host.execute_menu_item(&input.path).await?;
        Ok(ExecuteMenuItemOutput { ack: true })
    }
}
