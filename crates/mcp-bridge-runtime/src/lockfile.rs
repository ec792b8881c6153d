//! Presence-flag lock files (§6 "Persisted state layout"):
//! `Temp/compiling.lock`, `Temp/domainreload.lock`,
//! `Temp/serverstarting.lock`. Existence, not contents, signals that the
//! environment is busy; readers treat them as advisory, so acquiring one
//! is just creating an empty file and releasing it is just removing it.

use std::io;
use std::path::{Path, PathBuf};

/// Which of the three presence flags a [`PresenceLock`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Compiling,
    DomainReload,
    ServerStarting,
}

impl LockKind {
    fn file_name(self) -> &'static str {
        match self {
            LockKind::Compiling => "compiling.lock",
            LockKind::DomainReload => "domainreload.lock",
            LockKind::ServerStarting => "serverstarting.lock",
        }
    }
}

/// RAII guard over one presence-flag file: created on acquire, removed on
/// drop. Advisory only — nothing stops a second guard of the same kind
/// from being acquired concurrently, since the contract is "signal busy",
/// not mutual exclusion.
pub struct PresenceLock {
    path: PathBuf,
}

impl PresenceLock {
    pub fn acquire(project_root: &Path, kind: LockKind) -> io::Result<Self> {
        let path = project_root.join("Temp").join(kind.file_name());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, b"")?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PresenceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Whether `kind`'s presence flag currently exists under `project_root`.
pub fn is_present(project_root: &Path, kind: LockKind) -> bool {
    project_root.join("Temp").join(kind.file_name()).exists()
}
