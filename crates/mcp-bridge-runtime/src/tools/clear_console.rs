use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClearConsoleInput {}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ClearConsoleOutput {
    pub ack: bool,
}

pub struct ClearConsoleTool {
    host: Arc<dyn EditorHost>,
}

impl ClearConsoleTool {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for ClearConsoleTool {
    type Input = ClearConsoleInput;
    type Output = ClearConsoleOutput;
    type Error = Error;

    fn name() -> &'static str {
        "clear-console"
    }

    fn description() -> &'static str {
        "Clears the editor console."
    }

    async fn handle(&self, _input: Self::Input) -> Result<Self::Output> {
        self.host.clear_console().await?;
        Ok(ClearConsoleOutput { ack: true })
    }
}
