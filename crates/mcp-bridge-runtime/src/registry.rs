use crate::{Error, Result, Tool};
use rustc_hash::FxHashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A tool's descriptor as seen by `get-tool-details` (§3).
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    // Cloned into `get-tool-details`'s snapshot (§3: registry is
    // immutable after bootstrap, so a one-time clone is cheap and safe).
    pub name: &'static str,
    pub description: &'static str,
    pub security_requirement: Option<&'static str>,
    pub development_only: bool,
    pub editor_thread_only: bool,
    pub input_schema: schemars::schema::RootSchema,
    pub output_schema: schemars::schema::RootSchema,
}

/// O(1) average-case tool registry (C5), keyed by kebab-case tool name.
pub struct ToolRegistry {
    entries: FxHashMap<&'static str, Arc<dyn RegistryEntry>>,
}

trait RegistryEntry: Send + Sync {
    fn dispatch(&self, params: serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value>>;
    fn descriptor(&self) -> ToolDescriptor;
}

struct RegistryEntryImpl<T: Tool> {
    tool: Arc<T>,
}

impl<T> RegistryEntry for RegistryEntryImpl<T>
where
    T: Tool,
    T::Input: 'static,
    T::Output: 'static,
{
    fn dispatch(&self, params: serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value>> {
        let input: T::Input = match serde_json::from_value(params) {
            Ok(input) => input,
            Err(e) => return Box::pin(async move { Err(Error::InvalidParams(e.to_string())) }),
        };

        let tool = self.tool.clone();
        Box::pin(async move {
            let output = tool.handle(input).await.map_err(Into::into)?;
            serde_json::to_value(&output).map_err(Error::Serialization)
        })
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: T::name(),
            description: T::description(),
            security_requirement: T::security_requirement(),
            development_only: T::development_only(),
            editor_thread_only: T::editor_thread_only(),
            input_schema: T::input_schema(),
            output_schema: T::output_schema(),
        }
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool,
        T::Input: 'static,
        T::Output: 'static,
    {
        let entry = RegistryEntryImpl { tool: Arc::new(tool) };
        self.entries.insert(T::name(), Arc::new(entry));
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub async fn dispatch(&self, name: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        match self.entries.get(name) {
            Some(entry) => entry.dispatch(params).await,
            None => Err(Error::UnknownTool(name.to_string())),
        }
    }

    pub fn descriptor(&self, name: &str) -> Option<ToolDescriptor> {
        self.entries.get(name).map(|e| e.descriptor())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.values().map(|e| e.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, JsonSchema)]
    struct PingInput {}

    #[derive(Debug, Serialize, JsonSchema)]
    struct PingOutput {
        pong: bool,
    }

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        type Input = PingInput;
        type Output = PingOutput;
        type Error = Error;

        fn name() -> &'static str {
            "ping"
        }

        fn description() -> &'static str {
            "Health check"
        }

        async fn handle(&self, _input: Self::Input) -> Result<Self::Output> {
            Ok(PingOutput { pong: true })
        }
    }

    #[tokio::test]
    async fn test_register_then_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);

        assert!(registry.has_tool("ping"));
        let result = registry
            .dispatch("ping", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["pong"], true);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.dispatch("nope", serde_json::json!({})).await,
            Err(Error::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_params() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);
        assert!(matches!(
            registry.dispatch("ping", serde_json::json!("not-an-object")).await,
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn test_descriptor_reports_metadata() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);
        let d = registry.descriptor("ping").unwrap();
        assert_eq!(d.name, "ping");
        assert_eq!(d.security_requirement, None);
        assert!(!d.development_only);
    }
}
