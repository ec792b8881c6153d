#![no_main]

use libfuzzer_sys::fuzz_target;
use mcp_bridge_runtime::ToolRegistry;

fuzz_target!(|data: &[u8]| {
    let registry = ToolRegistry::new();

    if let Ok(name) = std::str::from_utf8(data) {
        let _ = registry.has_tool(name);
        let _ = registry.descriptor(name);
    }

    let _ = registry.has_tool("");
    let long_name = "a".repeat(10_000);
    let _ = registry.has_tool(&long_name);
});
