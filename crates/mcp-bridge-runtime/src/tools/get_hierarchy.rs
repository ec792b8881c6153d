use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetHierarchyInput {
    #[serde(rename = "IncludeInactive", default)]
    pub include_inactive: bool,
    #[serde(rename = "MaxDepth", default)]
    pub max_depth: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetHierarchyOutput {
    pub tree: serde_json::Value,
}

pub struct GetHierarchyTool {
    host: Arc<dyn EditorHost>,
}

impl GetHierarchyTool {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for GetHierarchyTool {
    type Input = GetHierarchyInput;
    type Output = GetHierarchyOutput;
    type Error = Error;

    fn name() -> &'static str {
        "get-hierarchy"
    }

    fn description() -> &'static str {
        "Returns the nested scene tree."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let options = serde_json::json!({
            "includeInactive": input.include_inactive,
            "maxDepth": input.max_depth,
        });
        let tree = self.host.get_hierarchy(options).await?;
        Ok(GetHierarchyOutput { tree })
    }
}
