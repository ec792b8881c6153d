use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::Tool;
use crate::session::SessionStore;
use crate::{Error, Result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetClientNameInput {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SetClientNameOutput {
    pub ack: bool,
}

pub struct SetClientNameTool {
    session: Arc<SessionStore>,
}

impl SetClientNameTool {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for SetClientNameTool {
    type Input = SetClientNameInput;
    type Output = SetClientNameOutput;
    type Error = Error;

    fn name() -> &'static str {
        "set-client-name"
    }

    fn description() -> &'static str {
        "Records the connecting client's display name in the session."
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        self.session.set_client_name(Some(input.name))?;
        Ok(SetClientNameOutput { ack: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_client_name_persists() {
        let dir = tempdir().unwrap();
        let session = Arc::new(SessionStore::load(dir.path().join("s.yaml")).unwrap());
        let tool = SetClientNameTool::new(session.clone());

        tool.handle(SetClientNameInput {
            name: "codex-cli".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(session.snapshot().client_name, Some("codex-cli".to_string()));
    }
}
