use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::handler::Tool;
use crate::registry::ToolDescriptor;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetToolDetailsInput {
    #[serde(rename = "IncludeDevelopmentOnly", default)]
    pub include_development_only: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ToolDetail {
    pub name: String,
    pub description: String,
    pub security_requirement: Option<String>,
    pub development_only: bool,
    #[schemars(with = "serde_json::Value")]
    pub input_schema: schemars::schema::RootSchema,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetToolDetailsOutput {
    pub tools: Vec<ToolDetail>,
}

/// §4.5: the one built-in tool that must see every other descriptor. The
/// registry is immutable after bootstrap (§3 "Tool descriptor"), so this
/// holds a snapshot taken once all other tools have been registered,
/// rather than a handle back into the registry it is itself part of.
pub struct GetToolDetailsTool {
    descriptors: Vec<ToolDescriptor>,
}

impl GetToolDetailsTool {
    pub fn new(descriptors: Vec<ToolDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait]
impl Tool for GetToolDetailsTool {
    type Input = GetToolDetailsInput;
    type Output = GetToolDetailsOutput;
    type Error = Error;

    fn name() -> &'static str {
        "get-tool-details"
    }

    fn description() -> &'static str {
        "Returns the full tool descriptor list with parameter schemas."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let tools = self
            .descriptors
            .iter()
            .cloned()
            .filter(|d| input.include_development_only || !d.development_only)
            .map(|d| ToolDetail {
                name: d.name.to_string(),
                description: d.description.to_string(),
                security_requirement: d.security_requirement.map(str::to_string),
                development_only: d.development_only,
                input_schema: d.input_schema,
            })
            .collect();

        Ok(GetToolDetailsOutput { tools })
    }
}
