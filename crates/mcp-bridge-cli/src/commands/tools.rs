use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use mcp_bridge_config::SandboxLevel;
use mcp_bridge_runtime::host::test_support::NullEditorHost;
use mcp_bridge_runtime::tools::register_all;
use mcp_bridge_runtime::SessionStore;

pub fn execute(include_development_only: bool) -> Result<()> {
    let dir = tempfile::tempdir()?;
    let session = Arc::new(SessionStore::load(dir.path().join("settings.yaml"))?);
    let registry = register_all(
        Arc::new(NullEditorHost),
        session,
        PathBuf::from("."),
        SandboxLevel::Restricted,
    );

    for descriptor in registry.descriptors() {
        if descriptor.development_only && !include_development_only {
            continue;
        }
        println!("{:<24} {}", descriptor.name, descriptor.description);
        if let Some(requirement) = descriptor.security_requirement {
            println!("{:<24} requires capability: {}", "", requirement);
        }
    }

    Ok(())
}
