//! Security gate (C6, §5): checks a dispatched tool's declared
//! `security_requirement` against the session's [`SecurityCapabilities`]
//! before the registry ever runs the handler.

use mcp_bridge_config::SecurityCapabilities;

use crate::registry::ToolDescriptor;
use crate::{Error, Result};

pub struct SecurityGate<'a> {
    capabilities: &'a SecurityCapabilities,
}

impl<'a> SecurityGate<'a> {
    pub fn new(capabilities: &'a SecurityCapabilities) -> Self {
        Self { capabilities }
    }

    /// §5 step 1: a tool with no `security_requirement` always passes.
    /// A tool that names a capability passes only if that capability's
    /// flag is set; otherwise the call is rejected before dispatch.
    pub fn check(&self, descriptor: &ToolDescriptor) -> Result<()> {
        let Some(requirement) = descriptor.security_requirement else {
            return Ok(());
        };

        let allowed = match requirement {
            "allow_test_execution" => self.capabilities.allow_test_execution,
            "allow_menu_execution" => self.capabilities.allow_menu_execution,
            unknown => {
                return Err(Error::Internal(format!(
                    "tool \"{}\" declares unknown security requirement \"{}\"",
                    descriptor.name, unknown
                )))
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(Error::SecurityBlocked {
                command: descriptor.name.to_string(),
                reason: format!("capability \"{}\" is not enabled", requirement),
                violations: Vec::new(),
            })
        }
    }

    /// §5 step 2: tools marked development-only are rejected outside a
    /// development host context, independent of capability flags.
    pub fn check_development_only(
        &self,
        descriptor: &ToolDescriptor,
        is_development_host: bool,
    ) -> Result<()> {
        if descriptor.development_only && !is_development_host {
            return Err(Error::SecurityBlocked {
                command: descriptor.name.to_string(),
                reason: "tool is restricted to development hosts".to_string(),
                violations: Vec::new(),
            });
        }
        Ok(())
    }
}
