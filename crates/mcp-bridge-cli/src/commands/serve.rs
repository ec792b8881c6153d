use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mcp_bridge_config::{parse_settings, BridgeSettings};
use mcp_bridge_runtime::host::test_support::NullEditorHost;
use mcp_bridge_runtime::{BridgeServer, SessionStore};

/// Starts the bridge against a [`NullEditorHost`] (§6 "test/demo
/// default"): a concrete editor binding is an out-of-scope integration
/// this crate only defines the seam for, so the standalone CLI runs
/// against stub editor responses.
pub async fn execute(settings_path: &str, port: Option<u32>, project_root: &str) -> Result<()> {
    let settings_path = PathBuf::from(settings_path);
    let settings = if settings_path.exists() {
        parse_settings(&settings_path).context("failed to parse settings")?
    } else {
        BridgeSettings::default()
    };

    let session = Arc::new(SessionStore::load(&settings_path).context("failed to load session")?);
    let host = Arc::new(NullEditorHost);
    let server = Arc::new(BridgeServer::new(
        host,
        session,
        settings,
        Path::new(project_root).to_path_buf(),
    ));

    let requested = port.unwrap_or(mcp_bridge_config::DEFAULT_PORT as u32);
    let (bound_port, listener) = server
        .start(requested)
        .map_err(|e| anyhow::anyhow!("failed to start bridge: {}", e))?;

    eprintln!("mcp-bridge listening on 127.0.0.1:{}", bound_port);

    server.serve(listener).await.context("bridge server error")?;
    Ok(())
}
