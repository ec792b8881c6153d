use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::handler::Tool;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PingInput {
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PingOutput {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "ExecutionTimeMs")]
    pub execution_time_ms: u64,
}

pub struct PingTool;

#[async_trait]
impl Tool for PingTool {
    type Input = PingInput;
    type Output = PingOutput;
    type Error = Error;

    fn name() -> &'static str {
        "ping"
    }

    fn description() -> &'static str {
        "Health check; echoes the supplied message."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let start = Instant::now();
        let message = format!("Bridge received: {}", input.message);
        Ok(PingOutput {
            message,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
