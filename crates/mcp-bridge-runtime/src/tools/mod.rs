//! All built-in tools from §6's table. Each submodule owns one tool's
//! typed input/output and its `Tool` impl.

pub mod clear_console;
pub mod compile;
pub mod execute_dynamic_code;
pub mod execute_menu_item;
pub mod find_game_objects;
pub mod get_hierarchy;
pub mod get_logs;
pub mod get_tool_details;
pub mod ping;
pub mod set_client_name;

use std::path::PathBuf;
use std::sync::Arc;

use mcp_bridge_config::SandboxLevel;

use crate::host::EditorHost;
use crate::registry::ToolRegistry;
use crate::session::SessionStore;

/// Registers all eleven built-in tools (§6). `get-tool-details` is added
/// last since it closes over the already-populated registry.
pub fn register_all(
    host: Arc<dyn EditorHost>,
    session: Arc<SessionStore>,
    project_root: PathBuf,
    sandbox_level: SandboxLevel,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(ping::PingTool);
    registry.register(set_client_name::SetClientNameTool::new(session.clone()));
    registry.register(compile::CompileTool::new(host.clone(), project_root));
    registry.register(get_logs::GetLogsTool::new(host.clone()));
    registry.register(clear_console::ClearConsoleTool::new(host.clone()));
    registry.register(find_game_objects::FindGameObjectsTool::new(host.clone()));
    registry.register(get_hierarchy::GetHierarchyTool::new(host.clone()));
    registry.register(run_tests::RunTestsTool::new(host.clone()));
    registry.register(execute_menu_item::ExecuteMenuItemTool::new(host.clone()));
    registry.register(execute_dynamic_code::ExecuteDynamicCodeTool::new(host, sandbox_level));

    let details_tool = get_tool_details::GetToolDetailsTool::new(registry.descriptors());
    registry.register(details_tool);
    registry
}
