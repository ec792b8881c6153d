use crate::{BridgeSettings, ConfigError, Result};
use std::path::Path;

/// Parse a settings document from a YAML file on disk.
pub fn parse_settings(path: &Path) -> Result<BridgeSettings> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
    parse_settings_str(&content, path)
}

/// Parse a settings document from an in-memory string, dispatching on the
/// file extension between YAML and JSON (§6 lists both `.json` and `.yaml`
/// as the persisted layout).
pub fn parse_settings_str(text: &str, path: &Path) -> Result<BridgeSettings> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    } else {
        serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Serialize a settings document, matching the input format convention.
pub fn write_settings(path: &Path, settings: &BridgeSettings) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let serialized = if is_json {
        serde_json::to_string_pretty(settings).map_err(|e| ConfigError::ParseError(e.to_string()))?
    } else {
        serde_yaml::to_string(settings).map_err(|e| ConfigError::ParseError(e.to_string()))?
    };

    std::fs::write(path, serialized).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_PORT;

    #[test]
    fn test_parse_settings_yaml_minimal() {
        let yaml = r#"
isServerRunning: true
serverPort: 8700
customPort: 8700
isAfterReset: false
isReconnecting: false
"#;
        let settings = parse_settings_str(yaml, Path::new("settings.yaml")).unwrap();
        assert!(settings.session.is_server_running);
        assert_eq!(settings.session.server_port, DEFAULT_PORT as u32);
    }

    #[test]
    fn test_parse_settings_json_minimal() {
        let json = r#"{"isServerRunning": false, "serverPort": 8701, "customPort": 8701}"#;
        let settings = parse_settings_str(json, Path::new("settings.json")).unwrap();
        assert!(!settings.session.is_server_running);
        assert_eq!(settings.session.server_port, 8701);
    }

    #[test]
    fn test_parse_settings_invalid_yaml() {
        let yaml = "isServerRunning: [[[not valid";
        let result = parse_settings_str(yaml, Path::new("settings.yaml"));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_round_trip_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = BridgeSettings::default();
        settings.session.is_server_running = true;
        settings.session.server_port = 8750;

        write_settings(&path, &settings).unwrap();
        let loaded = parse_settings(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_parse_settings_file_not_found() {
        let result = parse_settings(Path::new("/nonexistent/settings.yaml"));
        assert!(matches!(result, Err(ConfigError::IoError(_, _))));
    }
}
