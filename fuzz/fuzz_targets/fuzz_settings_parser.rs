#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use mcp_bridge_config::{parse_settings_str, validate_settings};

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(settings) = parse_settings_str(yaml_str, Path::new("fuzz.yaml")) {
            let _ = validate_settings(&settings);
            let _ = serde_yaml::to_string(&settings);
        }
    }
});
