use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};

/// Core tool abstraction (§3 "Tool descriptor"). Every built-in tool
/// implements this once and is self-describing: its name, its schema, and
/// the capability it requires (if any) all live on the same type.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Input: JsonSchema + DeserializeOwned + Send;
    type Output: JsonSchema + Serialize + Send;
    type Error: Into<crate::Error>;

    /// Kebab-case wire name, e.g. `"run-tests"`.
    fn name() -> &'static str;

    fn description() -> &'static str;

    /// The security capability this tool requires, if any (§5 "Security
    /// gate"). `None` means the tool is always reachable.
    fn security_requirement() -> Option<&'static str> {
        None
    }

    /// Tools gated to non-production builds of the host (§3, `compile`'s
    /// sibling diagnostics). Blocked outright outside development contexts.
    fn development_only() -> bool {
        false
    }

    /// Whether this tool must run on the editor's main thread rather than
    /// the dispatch worker (§4.6, §5 "thread marshalling contract").
    fn editor_thread_only() -> bool {
        false
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    fn input_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Self::Input)
    }

    fn output_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Self::Output)
    }
}
