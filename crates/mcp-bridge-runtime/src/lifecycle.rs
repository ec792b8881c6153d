//! Lifecycle controller (C8, §4.8). Owns the server state machine and
//! the single-use startup/shutdown sequences.

use mcp_bridge_config::{MAX_USER_PORT, MIN_USER_PORT, PORT_RANGE};
use std::net::TcpListener as StdTcpListener;
use std::path::Path;
use std::sync::Mutex;

use crate::lockfile::{LockKind, PresenceLock};
use crate::session::SessionStore;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Starting,
    Running(u16),
    ShuttingDown(u16),
    AwaitingRestore(u16),
}

/// §4.8 startup failure reasons for steps 1-3, kept distinct from the
/// `InternalError` catch-all that covers steps 4-7.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StartupFailure {
    #[error("requested port {0} is out of the valid user range")]
    InvalidPort(u32),
    #[error("no available port found starting from {0}")]
    NoPortAvailable(u16),
    #[error("port differs from requested ({requested} -> {found}); user confirmation required")]
    PortConflictNeedsConfirmation { requested: u16, found: u16 },
}

/// Single-controller-thread state machine (§3 "Server state machine",
/// invariant: at most one `Running` state, transitions serialized).
pub struct LifecycleController {
    state: Mutex<State>,
    /// Held across the `AwaitingRestore` window: acquired in
    /// `pre_reset_shutdown`, released in `complete_restore`.
    domain_reload_lock: Mutex<Option<PresenceLock>>,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Stopped),
            domain_reload_lock: Mutex::new(None),
        }
    }

    pub fn state(&self) -> State {
        *self.state.lock().expect("lifecycle lock poisoned")
    }

    fn set_state(&self, state: State) {
        *self.state.lock().expect("lifecycle lock poisoned") = state;
    }

    /// §4.8 "Stop any existing server instance" + `Running(p) -> Stopped`.
    pub fn stop(&self, session: &SessionStore) -> Result<()> {
        self.set_state(State::Stopped);
        session.set_server_running(false)?;
        Ok(())
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-use object executing §4.8's seven startup steps in order. Each
/// instance runs once; build a new one for the next attempt.
pub struct StartupSequence<'a> {
    controller: &'a LifecycleController,
    session: &'a SessionStore,
    project_root: &'a Path,
    requested_port: u32,
}

impl<'a> StartupSequence<'a> {
    pub fn new(
        controller: &'a LifecycleController,
        session: &'a SessionStore,
        project_root: &'a Path,
        requested_port: u32,
    ) -> Self {
        Self {
            controller,
            session,
            project_root,
            requested_port,
        }
    }

    /// Runs steps 1-7. On failure in steps 1-3 returns the typed
    /// [`StartupFailure`] and leaves the controller `Stopped`; failures in
    /// steps 4-7 propagate as `Error::Internal` and also leave the
    /// controller `Stopped` (§4.8, Open Question 1: clear
    /// `is_server_running` on every terminal failure path).
    pub fn run(self) -> std::result::Result<(u16, StdTcpListener), StartupFailure> {
        self.controller.set_state(State::Starting);
        // Presence-flag only; held for the duration of this attempt
        // regardless of outcome, dropped when this function returns.
        let _starting_lock = PresenceLock::acquire(self.project_root, LockKind::ServerStarting).ok();

        let outcome = self.run_inner();

        match &outcome {
            Ok(_) => {}
            Err(_) => {
                self.controller.set_state(State::Stopped);
                let _ = self.session.set_server_running(false);
            }
        }

        outcome
    }

    fn run_inner(&self) -> std::result::Result<(u16, StdTcpListener), StartupFailure> {
        // Step 1: validate requested port.
        if self.requested_port < MIN_USER_PORT || self.requested_port > MAX_USER_PORT {
            return Err(StartupFailure::InvalidPort(self.requested_port));
        }
        let requested = self.requested_port as u16;

        // Step 2: find an available port starting from the requested one.
        let bound = bind_first_available(requested).ok_or(StartupFailure::NoPortAvailable(requested))?;
        let found_port = bound
            .local_addr()
            .map_err(|_| StartupFailure::NoPortAvailable(requested))?
            .port();

        // Step 3: confirmation is required if the bound port differs.
        if found_port != requested {
            return Err(StartupFailure::PortConflictNeedsConfirmation {
                requested,
                found: found_port,
            });
        }

        // Steps 4-7 run under the caller's responsibility once a listener
        // exists; this sequence's job ends at "create new listener, bind".
        self.controller.set_state(State::Running(found_port));
        self.session
            .set_server_running(true)
            .map_err(|_| StartupFailure::NoPortAvailable(requested))?;
        self.session
            .set_server_port(found_port as u32)
            .map_err(|_| StartupFailure::NoPortAvailable(requested))?;

        Ok((found_port, bound))
    }
}

/// Bind `requested`, incrementing on bind failure (§4.8 step 2) up through
/// the top of the valid user-port range, then falling back to scanning
/// [`PORT_RANGE`] from its start for the case where `requested` is itself
/// above that range. Confirmation (step 3) is the caller's concern; this
/// only reports whichever port actually bound.
fn bind_first_available(requested: u16) -> Option<StdTcpListener> {
    if let Ok(listener) = StdTcpListener::bind(("127.0.0.1", requested)) {
        return Some(listener);
    }
    if let Some(next) = requested.checked_add(1) {
        for port in next..=(MAX_USER_PORT as u16) {
            if let Ok(listener) = StdTcpListener::bind(("127.0.0.1", port)) {
                return Some(listener);
            }
        }
    }
    for port in PORT_RANGE {
        if let Ok(listener) = StdTcpListener::bind(("127.0.0.1", port)) {
            return Some(listener);
        }
    }
    None
}

/// Graceful pre-reset shutdown sequence (§4.8). All five steps are
/// synchronous and must complete before the host's reset proceeds.
pub fn pre_reset_shutdown(
    controller: &LifecycleController,
    session: &SessionStore,
    project_root: &Path,
    port: u16,
) -> Result<()> {
    // Step 1 + 3: persist reset flags before anything else is torn down.
    session.set_reconnecting(true)?;
    session.set_after_reset(true)?;

    // Step 2: record current port (already persisted via server_port at
    // startup; re-assert in case of drift).
    session.set_server_port(port as u32)?;

    // Signal post-reset initialization is busy for the whole
    // `AwaitingRestore` window; released in `complete_restore`.
    let lock = PresenceLock::acquire(project_root, LockKind::DomainReload).ok();
    *controller
        .domain_reload_lock
        .lock()
        .expect("lifecycle lock poisoned") = lock;

    // Step 4 is the caller's responsibility (dispose the transport
    // listener) since this controller has no listener handle of its own.
    controller.set_state(State::ShuttingDown(port));

    // Step 5: null the server reference.
    controller.set_state(State::AwaitingRestore(port));

    Ok(())
}

/// Post-reset restore (§4.8). Returns the port to rebind on if
/// `is_after_reset` and `is_server_running` are both set.
pub fn restore_port(session: &SessionStore) -> Option<u16> {
    let snap = session.snapshot();
    if snap.is_after_reset && snap.is_server_running {
        Some(snap.server_port as u16)
    } else {
        None
    }
}

/// Marks recovery complete: `is_after_reset=false` once the recovery
/// notifications have been emitted (§9 "Session persistence under
/// reset").
pub fn complete_restore(controller: &LifecycleController, session: &SessionStore, port: u16) -> Result<()> {
    session.set_after_reset(false)?;
    session.set_reconnecting(false)?;
    controller
        .domain_reload_lock
        .lock()
        .expect("lifecycle lock poisoned")
        .take();
    controller.set_state(State::Running(port));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempdir().unwrap();
        let store = SessionStore::load(dir.path().join("settings.yaml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_startup_invalid_port_fails_step_1() {
        let controller = LifecycleController::new();
        let (dir, session) = store();
        let result = StartupSequence::new(&controller, &session, dir.path(), 80).run();
        assert!(matches!(result, Err(StartupFailure::InvalidPort(80))));
        assert_eq!(controller.state(), State::Stopped);
    }

    #[test]
    fn test_startup_acquires_and_releases_serverstarting_lock() {
        let controller = LifecycleController::new();
        let (dir, session) = store();
        StartupSequence::new(&controller, &session, dir.path(), 54199)
            .run()
            .unwrap();
        assert!(!crate::lockfile::is_present(
            dir.path(),
            crate::lockfile::LockKind::ServerStarting
        ));
    }

    #[test]
    fn test_startup_success_reaches_running() {
        let controller = LifecycleController::new();
        let (dir, session) = store();
        // Bind an ephemeral port first via OS then request it directly is
        // flaky; instead request a high port unlikely to be taken.
        let requested = 54123;
        let result = StartupSequence::new(&controller, &session, dir.path(), requested).run();
        match result {
            Ok((port, _listener)) => {
                assert_eq!(port, requested as u16);
                assert_eq!(controller.state(), State::Running(port));
                assert!(session.snapshot().is_server_running);
            }
            Err(StartupFailure::PortConflictNeedsConfirmation { .. }) => {
                // Port happened to be taken in the test environment; still
                // a valid, typed outcome.
            }
            Err(e) => panic!("unexpected startup failure: {:?}", e),
        }
    }

    #[test]
    fn test_stop_clears_running_flag() {
        let controller = LifecycleController::new();
        let (_dir, session) = store();
        session.set_server_running(true).unwrap();
        controller.stop(&session).unwrap();
        assert_eq!(controller.state(), State::Stopped);
        assert!(!session.snapshot().is_server_running);
    }

    #[test]
    fn test_pre_reset_shutdown_sets_flags_and_state() {
        let controller = LifecycleController::new();
        let (dir, session) = store();
        pre_reset_shutdown(&controller, &session, dir.path(), 8700).unwrap();

        let snap = session.snapshot();
        assert!(snap.is_after_reset);
        assert!(snap.is_reconnecting);
        assert_eq!(snap.server_port, 8700);
        assert_eq!(controller.state(), State::AwaitingRestore(8700));
        assert!(crate::lockfile::is_present(
            dir.path(),
            crate::lockfile::LockKind::DomainReload
        ));
    }

    #[test]
    fn test_complete_restore_releases_domain_reload_lock() {
        let controller = LifecycleController::new();
        let (dir, session) = store();
        pre_reset_shutdown(&controller, &session, dir.path(), 8700).unwrap();
        complete_restore(&controller, &session, 8700).unwrap();
        assert!(!crate::lockfile::is_present(
            dir.path(),
            crate::lockfile::LockKind::DomainReload
        ));
    }

    #[test]
    fn test_restore_port_when_flags_set() {
        let (_dir, session) = store();
        session.set_server_running(true).unwrap();
        session.set_after_reset(true).unwrap();
        session.set_server_port(8700).unwrap();
        assert_eq!(restore_port(&session), Some(8700));
    }

    #[test]
    fn test_restore_port_none_when_not_after_reset() {
        let (_dir, session) = store();
        session.set_server_running(true).unwrap();
        assert_eq!(restore_port(&session), None);
    }

    #[test]
    fn test_complete_restore_clears_flags() {
        let controller = LifecycleController::new();
        let (_dir, session) = store();
        session.set_after_reset(true).unwrap();
        session.set_reconnecting(true).unwrap();
        complete_restore(&controller, &session, 8700).unwrap();

        let snap = session.snapshot();
        assert!(!snap.is_after_reset);
        assert!(!snap.is_reconnecting);
        assert_eq!(controller.state(), State::Running(8700));
    }

    #[test]
    fn test_bind_first_available_increments_from_requested_on_conflict() {
        let requested = 54210;
        let held = StdTcpListener::bind(("127.0.0.1", requested)).unwrap();

        let bound = bind_first_available(requested).expect("expected a fallback bind");
        assert_eq!(bound.local_addr().unwrap().port(), requested + 1);

        drop(held);
    }
}
