use crate::{BridgeSettings, ConfigError, Result, MAX_USER_PORT, MIN_USER_PORT};
use std::collections::HashSet;

/// Validate a port against §4.8 step 1: range `1024..=65535`, not reserved.
pub fn validate_port(port: u32) -> Result<()> {
    if port < MIN_USER_PORT || port > MAX_USER_PORT {
        return Err(ConfigError::InvalidPort(port));
    }
    // Ports below 1024 are already excluded by the range check above; the
    // remaining reserved set (per the host platform) is treated as empty
    // here since recognizing them is host-specific and out of scope.
    Ok(())
}

/// Validate a full settings document before it is persisted or acted on.
pub fn validate_settings(settings: &BridgeSettings) -> Result<()> {
    validate_port(settings.session.server_port)?;
    validate_port(settings.session.custom_port)?;

    let mut seen = HashSet::new();
    for endpoint in &settings.session.push_server_endpoints {
        if !seen.insert(endpoint.client_name.clone()) {
            return Err(ConfigError::DuplicateClient(endpoint.client_name.clone()));
        }
    }

    Ok(())
}
