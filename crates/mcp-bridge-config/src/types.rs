use serde::{Deserialize, Serialize};

/// Default port the bridge listens on before any conflict resolution.
pub const DEFAULT_PORT: u16 = 8700;

/// Inclusive port-search range used when the default port is taken.
pub const PORT_RANGE: std::ops::RangeInclusive<u16> = 8700..=9100;

/// Lowest port the bridge will ever bind to; anything below is a reserved
/// system port per §4.8 step 1.
pub const MIN_USER_PORT: u32 = 1024;
pub const MAX_USER_PORT: u32 = 65535;

/// One connected client's push-notification routing triple.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientEndpoint {
    pub client_name: String,
    pub client_endpoint: String,
    pub push_receive_server_endpoint: String,
}

/// The session record — persisted so reconnection intent and client
/// identity survive a host environment reset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub is_server_running: bool,
    #[serde(default = "default_port_u32")]
    pub server_port: u32,
    #[serde(default = "default_port_u32")]
    pub custom_port: u32,
    #[serde(default)]
    pub is_after_reset: bool,
    #[serde(default)]
    pub is_reconnecting: bool,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub push_server_endpoints: Vec<ClientEndpoint>,
}

fn default_port_u32() -> u32 {
    DEFAULT_PORT as u32
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            is_server_running: false,
            server_port: DEFAULT_PORT as u32,
            custom_port: DEFAULT_PORT as u32,
            is_after_reset: false,
            is_reconnecting: false,
            client_name: None,
            push_server_endpoints: Vec::new(),
        }
    }
}

/// Two capability gates the security gate (C6) checks against a tool's
/// `security_requirement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SecurityCapabilities {
    #[serde(default)]
    pub allow_test_execution: bool,
    #[serde(default)]
    pub allow_menu_execution: bool,
}

impl Default for SecurityCapabilities {
    fn default() -> Self {
        // Capabilities are opt-in.
        Self {
            allow_test_execution: false,
            allow_menu_execution: false,
        }
    }
}

/// Sandbox policy level for `execute-dynamic-code` (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SandboxLevel {
    Disabled,
    #[default]
    Restricted,
    FullAccess,
}

/// Root persisted document (§6 "Persisted state layout").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSettings {
    #[serde(flatten)]
    pub session: SessionRecord,
    #[serde(default)]
    pub security: SecurityCapabilities,
    #[serde(default)]
    pub sandbox_level: SandboxLevel,
}
