use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetLogsInput {
    #[serde(rename = "LogType", default)]
    pub log_type: Option<String>,
    #[serde(rename = "MaxCount", default)]
    pub max_count: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetLogsOutput {
    pub logs: serde_json::Value,
}

pub struct GetLogsTool {
    host: Arc<dyn EditorHost>,
}

impl GetLogsTool {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for GetLogsTool {
    type Input = GetLogsInput;
    type Output = GetLogsOutput;
    type Error = Error;

    fn name() -> &'static str {
        "get-logs"
    }

    fn description() -> &'static str {
        "Returns recent console log records, optionally filtered by type."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let filter = serde_json::json!({
            "logType": input.log_type,
            "maxCount": input.max_count,
        });
        let logs = self.host.get_logs(filter).await?;
        Ok(GetLogsOutput { logs })
    }
}
