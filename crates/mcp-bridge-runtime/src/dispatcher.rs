//! Dispatcher (C6, §4.6): registry lookup, security gate, parameter
//! binding, and serialized response — a layer plain registry dispatch
//! does not need since it has no security or thread-handoff concerns of
//! its own.

use mcp_bridge_config::SecurityCapabilities;
use serde_json::Value;

use crate::registry::ToolRegistry;
use crate::security::SecurityGate;
use crate::timeout::{retry_with_policy, RetryPolicy};
use crate::{Error, Result};

pub struct Dispatcher<'a> {
    registry: &'a ToolRegistry,
    capabilities: &'a SecurityCapabilities,
    is_development_host: bool,
    retry_policy: RetryPolicy,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ToolRegistry, capabilities: &'a SecurityCapabilities, is_development_host: bool) -> Self {
        Self {
            registry,
            capabilities,
            is_development_host,
            retry_policy: RetryPolicy::new(3).with_backoff(
                std::time::Duration::from_millis(50),
                std::time::Duration::from_secs(2),
            ),
        }
    }

    /// §4.6 steps 1-6. Step 4 ("thread handoff") is represented here by
    /// the `editor_thread_only` flag on the descriptor; the caller
    /// (`server`/`transport`) is responsible for actually routing the
    /// call through `EditorHost::run_on_main_thread` when that flag is
    /// set, since only it holds the host handle. A host mid-reset reports
    /// `EnvironmentBusy`; editor-thread tools get bounded retries around
    /// that one failure instead of making the caller loop by hand.
    pub async fn dispatch(&self, tool_name: &str, params: Value) -> Result<Value> {
        // Step 1: registry lookup.
        let descriptor = self
            .registry
            .descriptor(tool_name)
            .ok_or_else(|| Error::UnknownTool(tool_name.to_string()))?;

        // Step 2: security check (capability + development-only gating).
        let gate = SecurityGate::new(self.capabilities);
        gate.check(&descriptor)?;
        gate.check_development_only(&descriptor, self.is_development_host)?;

        // Steps 3 + 5/6: parameter binding, invocation, response mapping
        // all happen inside the registry entry; its `InvalidParams` and
        // handler-error mapping already match §7's taxonomy.
        if descriptor.editor_thread_only {
            retry_with_policy(&self.retry_policy, || {
                self.registry.dispatch(tool_name, params.clone())
            })
            .await
        } else {
            self.registry.dispatch(tool_name, params).await
        }
    }

    pub fn requires_editor_thread(&self, tool_name: &str) -> bool {
        self.registry
            .descriptor(tool_name)
            .map(|d| d.editor_thread_only)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Tool;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, JsonSchema)]
    struct GatedInput {}

    #[derive(Debug, Serialize, JsonSchema)]
    struct GatedOutput {
        ok: bool,
    }

    struct GatedTool;

    #[async_trait]
    impl Tool for GatedTool {
        type Input = GatedInput;
        type Output = GatedOutput;
        type Error = Error;

        fn name() -> &'static str {
            "run-tests"
        }

        fn description() -> &'static str {
            "runs tests"
        }

        fn security_requirement() -> Option<&'static str> {
            Some("allow_test_execution")
        }

        async fn handle(&self, _input: Self::Input) -> Result<Self::Output> {
            Ok(GatedOutput { ok: true })
        }
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_unknown_tool_error() {
        let registry = ToolRegistry::new();
        let caps = SecurityCapabilities::default();
        let dispatcher = Dispatcher::new(&registry, &caps, true);
        assert!(matches!(
            dispatcher.dispatch("nope", serde_json::json!({})).await,
            Err(Error::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_blocked_by_security_gate_before_invocation() {
        let mut registry = ToolRegistry::new();
        registry.register(GatedTool);
        let caps = SecurityCapabilities::default();
        let dispatcher = Dispatcher::new(&registry, &caps, true);

        assert!(matches!(
            dispatcher.dispatch("run-tests", serde_json::json!({})).await,
            Err(Error::SecurityBlocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatch_succeeds_when_capability_enabled() {
        let mut registry = ToolRegistry::new();
        registry.register(GatedTool);
        let caps = SecurityCapabilities {
            allow_test_execution: true,
            allow_menu_execution: false,
        };
        let dispatcher = Dispatcher::new(&registry, &caps, true);

        let result = dispatcher
            .dispatch("run-tests", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["ok"], true);
    }

    struct FlakyEditorThreadTool {
        attempts: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl Tool for FlakyEditorThreadTool {
        type Input = GatedInput;
        type Output = GatedOutput;
        type Error = Error;

        fn name() -> &'static str {
            "compile"
        }

        fn description() -> &'static str {
            "flaky compile for retry testing"
        }

        fn editor_thread_only() -> bool {
            true
        }

        async fn handle(&self, _input: Self::Input) -> Result<Self::Output> {
            let attempt = self
                .attempts
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if attempt == 0 {
                Err(Error::EnvironmentBusy("reset in progress".to_string()))
            } else {
                Ok(GatedOutput { ok: true })
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_retries_editor_thread_tool_on_environment_busy() {
        let mut registry = ToolRegistry::new();
        registry.register(FlakyEditorThreadTool {
            attempts: std::sync::atomic::AtomicU32::new(0),
        });
        let caps = SecurityCapabilities::default();
        let dispatcher = Dispatcher::new(&registry, &caps, true);

        let result = dispatcher
            .dispatch("compile", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["ok"], true);
    }
}
