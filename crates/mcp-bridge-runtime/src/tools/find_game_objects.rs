use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::host::EditorHost;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindGameObjectsInput {
    #[serde(rename = "NamePattern", default)]
    pub name_pattern: Option<String>,
    #[serde(rename = "Tag", default)]
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FindGameObjectsOutput {
    pub matches: serde_json::Value,
}

pub struct FindGameObjectsTool {
    host: Arc<dyn EditorHost>,
}

impl FindGameObjectsTool {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for FindGameObjectsTool {
    type Input = FindGameObjectsInput;
    type Output = FindGameObjectsOutput;
    type Error = Error;

    fn name() -> &'static str {
        "find-game-objects"
    }

    fn description() -> &'static str {
        "Searches the active scene for entities matching the given criteria."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let criteria = serde_json::json!({
            "namePattern": input.name_pattern,
            "tag": input.tag,
        });
        let matches = self.host.find_game_objects(criteria).await?;
        Ok(FindGameObjectsOutput { matches })
    }
}
