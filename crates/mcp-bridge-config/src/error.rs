use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid port {0}: must be in range 1024..=65535")]
    InvalidPort(u32),

    #[error("Port {0} is a reserved system port")]
    ReservedPort(u32),

    #[error("Duplicate client endpoint: {0}")]
    DuplicateClient(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
