//! Session manager (C7, §4.7). A single-instance, file-backed document
//! that survives in-process environment resets. Grounded in
//! `mcp_bridge_config::parser`'s read/parse split; writes go through the
//! same serializer so the file the sandbox/controller reads back is
//! byte-compatible.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use mcp_bridge_config::{ClientEndpoint, SessionRecord};

use crate::{Error, Result};

/// Synchronous, exclusively-locked store over a single [`SessionRecord`]
/// (§5 "Shared resources": writes take an exclusive lock, readers may
/// observe stale-but-consistent snapshots).
pub struct SessionStore {
    path: PathBuf,
    record: RwLock<SessionRecord>,
}

impl SessionStore {
    /// Load from `path` if present, otherwise start from a fresh default
    /// record (first run, no prior session).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let record = if path.exists() {
            mcp_bridge_config::parse_settings(&path)
                .map(|settings| settings.session)
                .map_err(|e| Error::Internal(e.to_string()))?
        } else {
            SessionRecord::default()
        };

        Ok(Self {
            path,
            record: RwLock::new(record),
        })
    }

    fn persist(&self, record: &SessionRecord) -> Result<()> {
        let mut settings = if self.path.exists() {
            mcp_bridge_config::parse_settings(&self.path)
                .unwrap_or_default()
        } else {
            mcp_bridge_config::BridgeSettings::default()
        };
        settings.session = record.clone();
        mcp_bridge_config::write_settings(&self.path, &settings)
            .map_err(|e| Error::Internal(e.to_string()))
    }

    pub fn snapshot(&self) -> SessionRecord {
        self.record.read().expect("session lock poisoned").clone()
    }

    /// §4.7: read/write must complete synchronously before a reset is
    /// acknowledged, so every setter persists inline rather than batching.
    pub fn set_server_running(&self, running: bool) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard.is_server_running = running;
        self.persist(&guard)
    }

    pub fn set_server_port(&self, port: u32) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard.server_port = port;
        self.persist(&guard)
    }

    pub fn set_after_reset(&self, after_reset: bool) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard.is_after_reset = after_reset;
        self.persist(&guard)
    }

    pub fn set_reconnecting(&self, reconnecting: bool) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard.is_reconnecting = reconnecting;
        self.persist(&guard)
    }

    pub fn set_client_name(&self, name: Option<String>) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard.client_name = name;
        self.persist(&guard)
    }

    pub fn add_push_endpoint(&self, endpoint: ClientEndpoint) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        guard
            .push_server_endpoints
            .retain(|e| e.client_name != endpoint.client_name);
        guard.push_server_endpoints.push(endpoint);
        self.persist(&guard)
    }

    pub fn get_all_push_endpoints(&self) -> Vec<ClientEndpoint> {
        self.record
            .read()
            .expect("session lock poisoned")
            .push_server_endpoints
            .clone()
    }

    /// §4.7 "clear() on explicit server stop": reset to defaults and
    /// persist.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.record.write().expect("session lock poisoned");
        *guard = SessionRecord::default();
        self.persist(&guard)
    }
}
