//! # mcp-bridge-config
//!
//! Persisted settings and session-record types for the editor bridge.
//!
//! The bridge core (`mcp-bridge-runtime`) treats this crate's
//! [`BridgeSettings`] document as the single source of truth for what
//! survives a host environment reset: whether the server was running,
//! which port it was bound to, and which clients were connected.
//!
//! ## Quick start
//!
//! ```rust
//! use mcp_bridge_config::{parse_settings_str, validate_settings};
//! use std::path::Path;
//!
//! let yaml = r#"
//! isServerRunning: true
//! serverPort: 8700
//! customPort: 8700
//! "#;
//!
//! let settings = parse_settings_str(yaml, Path::new("settings.yaml")).expect("valid settings");
//! validate_settings(&settings).expect("validation passes");
//! assert_eq!(settings.session.server_port, 8700);
//! ```

pub mod error;
pub mod parser;
pub mod types;
pub mod validator;

pub use error::{ConfigError, Result};
pub use parser::{parse_settings, parse_settings_str, write_settings};
pub use types::*;
pub use validator::{validate_port, validate_settings};
