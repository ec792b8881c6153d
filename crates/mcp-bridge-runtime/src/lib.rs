//! # mcp-bridge-runtime
//!
//! The hard core of the editor bridge: a length-prefixed JSON-RPC frame
//! codec, a tolerant reassembly buffer, a loopback TCP transport, a
//! typed tool registry and dispatcher with a capability-based security
//! gate, a lifecycle controller that survives in-process environment
//! resets, and a three-level dynamic-code sandbox.
//!
//! ## Quick start
//!
//! ```rust
//! use mcp_bridge_runtime::{Tool, ToolRegistry, Result};
//! use serde::{Deserialize, Serialize};
//! use schemars::JsonSchema;
//!
//! #[derive(Debug, Deserialize, JsonSchema)]
//! struct GreetInput {
//!     name: String,
//! }
//!
//! #[derive(Debug, Serialize, JsonSchema)]
//! struct GreetOutput {
//!     message: String,
//! }
//!
//! struct GreetTool;
//!
//! #[async_trait::async_trait]
//! impl Tool for GreetTool {
//!     type Input = GreetInput;
//!     type Output = GreetOutput;
//!     type Error = mcp_bridge_runtime::Error;
//!
//!     fn name() -> &'static str { "greet" }
//!     fn description() -> &'static str { "Greets the caller" }
//!
//!     async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
//!         Ok(GreetOutput { message: format!("Hello, {}!", input.name) })
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let mut registry = ToolRegistry::new();
//! registry.register(GreetTool);
//!
//! let result = registry.dispatch("greet", serde_json::json!({"name": "World"})).await?;
//! assert_eq!(result["message"], "Hello, World!");
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod handler;
pub mod host;
pub mod lifecycle;
pub mod lockfile;
pub mod middleware;
pub mod recovery;
pub mod registry;
pub mod rpc;
pub mod sandbox;
pub mod security;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod timeout;
pub mod tools;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use handler::Tool;
pub use host::EditorHost;
pub use lifecycle::{LifecycleController, StartupFailure, StartupSequence, State};
pub use lockfile::{LockKind, PresenceLock};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, ValidationMiddleware};
pub use recovery::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ErrorTracker, FallbackHandler,
    RecoveryMiddleware,
};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use sandbox::{check_source, Violation, ViolationKind};
pub use security::SecurityGate;
pub use server::BridgeServer;
pub use session::SessionStore;
pub use telemetry::{
    ComponentHealth, HealthCheck, HealthStatus, MetricsCollector, TelemetryMiddleware,
};
pub use timeout::{
    retry_with_policy, with_timeout, RetryMiddleware, RetryPolicy, TimeoutMiddleware,
};
pub use transport::{BridgeListener, ConnectionId};
