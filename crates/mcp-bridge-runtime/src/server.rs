//! `BridgeServer`: wires C1-C9 into the request flow described in §2's
//! control-flow narrative. Owns the transport, the registry, and the
//! per-request dispatch loop, the way a top-level server type typically
//! does, minus any stdio framing — this crate speaks the length-prefixed
//! wire format in [`crate::frame`] instead.

use std::net::TcpListener as StdTcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use mcp_bridge_config::{BridgeSettings, DEFAULT_PORT};
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::host::EditorHost;
use crate::lifecycle::{self, LifecycleController, StartupFailure, StartupSequence, State};
use crate::recovery::{CircuitBreaker, CircuitBreakerConfig};
use crate::registry::ToolRegistry;
use crate::rpc::{self, Response};
use crate::session::SessionStore;
use crate::tools;
use crate::transport::BridgeListener;
use crate::Result;

/// Everything the bridge needs for one running instance: the tool
/// registry built at bootstrap (§3: immutable afterward), the editor
/// seam, and the persisted session/security/sandbox configuration.
pub struct BridgeServer {
    registry: ToolRegistry,
    host: Arc<dyn EditorHost>,
    session: Arc<SessionStore>,
    settings: BridgeSettings,
    lifecycle: LifecycleController,
    editor_thread_breaker: CircuitBreaker,
    project_root: PathBuf,
}

impl BridgeServer {
    /// Bootstraps the tool registry (C5) from a settings snapshot and an
    /// editor binding. `project_root` roots `compile`'s at-most-once
    /// result-file contract (§4.6) and the three presence-flag lock files
    /// under `Temp/` (§6).
    pub fn new(
        host: Arc<dyn EditorHost>,
        session: Arc<SessionStore>,
        settings: BridgeSettings,
        project_root: PathBuf,
    ) -> Self {
        let registry = tools::register_all(host.clone(), session.clone(), project_root.clone(), settings.sandbox_level);
        Self {
            registry,
            host,
            session,
            settings,
            lifecycle: LifecycleController::new(),
            editor_thread_breaker: CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: 5,
                timeout: std::time::Duration::from_secs(10),
                success_threshold: 1,
            }),
            project_root,
        }
    }

    pub fn state(&self) -> State {
        self.lifecycle.state()
    }

    /// §4.8 steps 1-3: validate the requested port and bind it (or the
    /// next free one in range). Returns the bound listener pair for the
    /// caller to drive with [`BridgeServer::serve`].
    pub fn start(&self, requested_port: u32) -> std::result::Result<(u16, StdTcpListener), StartupFailure> {
        StartupSequence::new(&self.lifecycle, &self.session, &self.project_root, requested_port).run()
    }

    /// Convenience wrapper over [`BridgeServer::start`] using the
    /// persisted or default port.
    pub fn start_default(&self) -> std::result::Result<(u16, StdTcpListener), StartupFailure> {
        let requested = self.session.snapshot().server_port;
        let requested = if requested == 0 { DEFAULT_PORT as u32 } else { requested };
        self.start(requested)
    }

    /// Drives the accept loop against an already-bound std listener,
    /// converting it to tokio and routing every inbound frame through
    /// [`BridgeServer::handle_request`]. Runs until the listener errors.
    pub async fn serve(self: Arc<Self>, std_listener: StdTcpListener) -> Result<()> {
        std_listener.set_nonblocking(true)?;
        let tokio_listener = tokio::net::TcpListener::from_std(std_listener)?;
        let port = tokio_listener.local_addr()?.port();
        let (bridge, listener) = BridgeListener::bind(port).await?;
        let bridge = Arc::new(bridge);

        loop {
            let server = self.clone();
            bridge
                .accept_one(&listener, move |_id, payload| {
                    let server = server.clone();
                    async move { server.handle_request(&payload).await }
                })
                .await?;
        }
    }

    /// §4.4 per-message flow: parse, dispatch, reply. Returns `None` for
    /// notifications (no `id`); a JSON syntax error replies `-32700`, a
    /// well-formed-but-wrong-shape document replies `-32600` (§7) — neither
    /// faults the connection, since framing-level faults are already
    /// handled upstream in [`crate::transport`].
    pub async fn handle_request(&self, payload: &str) -> Option<String> {
        let request = match rpc::parse_request(payload) {
            Ok(request) => request,
            Err(err) => return Response::from_error(Value::Null, &err).to_json_string().ok(),
        };

        if request.is_notification() {
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let outcome = self.dispatch(&request.method, request.params).await;

        let response = match outcome {
            Ok(result) => Response::success(id, result),
            Err(err) => Response::from_error(id, &err),
        };
        response.to_json_string().ok()
    }

    /// §4.6: dispatch through the registry lookup and security gate.
    /// Editor-thread-only tools route their own body through
    /// [`EditorHost::run_on_main_thread`] internally, since only the tool
    /// implementation knows which part of its work needs the handoff. The
    /// dispatcher already retries a single `EnvironmentBusy`; the circuit
    /// breaker here sits above that, so a host stuck mid-reset across many
    /// requests trips once instead of every caller paying the full retry
    /// backoff.
    async fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        let dispatcher = Dispatcher::new(&self.registry, &self.settings.security, true);
        if dispatcher.requires_editor_thread(method) {
            self.editor_thread_breaker
                .call(|| dispatcher.dispatch(method, params))
                .await
        } else {
            dispatcher.dispatch(method, params).await
        }
    }

    /// §4.4: announce a tool-list change to every connection, coalesced
    /// per connection (§9 Open Question 2).
    pub async fn notify_tools_changed(&self, listener: &BridgeListener) -> Result<()> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/tools/list_changed",
        })
        .to_string();
        listener.broadcast(&payload, Some("tools/list_changed")).await
    }

    /// §4.8 pre-reset shutdown: persist reconnection intent via C7 and
    /// move the controller to `AwaitingRestore`. The caller is
    /// responsible for actually dropping the listener.
    pub fn pre_reset_shutdown(&self, port: u16) -> Result<()> {
        lifecycle::pre_reset_shutdown(&self.lifecycle, &self.session, &self.project_root, port)
    }

    /// §4.8 post-reset restore: returns the port to rebind on, if the
    /// session says a restore is owed.
    pub fn restore_port(&self) -> Option<u16> {
        lifecycle::restore_port(&self.session)
    }

    /// §4.8: marks the restore complete and notifies clients that the
    /// environment reload has recovered (§9 "Session persistence under
    /// reset").
    pub async fn complete_restore(&self, listener: &BridgeListener, port: u16) -> Result<()> {
        lifecycle::complete_restore(&self.lifecycle, &self.session, port)?;
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/environment_reload_recovered",
        })
        .to_string();
        listener.broadcast(&payload, None).await
    }

    pub fn stop(&self) -> Result<()> {
        self.lifecycle.stop(&self.session)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn host(&self) -> &Arc<dyn EditorHost> {
        &self.host
    }
}
