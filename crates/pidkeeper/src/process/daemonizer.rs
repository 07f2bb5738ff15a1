//! Implements the background detachment facility.
//!
//! Once a process has detached, the facility owns the PID file: it writes the
//! file during detachment and the returned [`DaemonContext`] removes it when
//! the application's main routine finishes, fails, or panics.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::pidfile::{PidFile, PidFileGuard};

use super::PROCESS_TARGET;
use super::controller::run_guarded;
use super::errors::{LifecycleError, MainError};

#[cfg(unix)]
use daemonize_me::Daemon;
#[cfg(unix)]
use std::ffi::OsStr;

/// Inputs handed to a [`Daemonizer`].
#[derive(Debug, Clone, Copy)]
pub struct DetachPlan<'a> {
    workspace: &'a Path,
    pid_file: &'a PidFile,
}

impl<'a> DetachPlan<'a> {
    /// Bundles the working directory and PID file for detachment.
    #[must_use]
    pub const fn new(workspace: &'a Path, pid_file: &'a PidFile) -> Self {
        Self {
            workspace,
            pid_file,
        }
    }

    /// Working directory of the detached process.
    #[must_use]
    pub const fn workspace(&self) -> &'a Path {
        self.workspace
    }

    /// PID file the facility must write and later remove.
    #[must_use]
    pub const fn pid_file(&self) -> &'a PidFile {
        self.pid_file
    }
}

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Returns false when the host cannot detach processes.
    fn is_supported(&self) -> bool;

    /// Detaches the process into the background and records its PID.
    ///
    /// Returns in the detached process only.
    fn daemonize(&self, plan: &DetachPlan<'_>) -> Result<DaemonContext, DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// System-level daemonisation failed.
    #[cfg(unix)]
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
    /// The host has no detachment facility.
    #[error("daemonisation is not supported on this platform")]
    Unsupported,
}

/// Execution context of a detached process.
#[derive(Debug)]
pub struct DaemonContext {
    guard: PidFileGuard,
}

impl DaemonContext {
    /// Takes ownership of the PID file written during detachment.
    #[must_use]
    pub fn new(pid_file: PidFile) -> Self {
        Self {
            guard: PidFileGuard::adopt(pid_file),
        }
    }

    /// Runs `main` inside the context, removing the PID file afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Main`] when `main` fails and
    /// [`LifecycleError::PidFile`] when the PID file cannot be removed after a
    /// successful run.
    pub fn run<F, E>(self, main: F) -> Result<(), LifecycleError>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<MainError>,
    {
        run_guarded(self.guard, main)
    }
}

/// Daemoniser that delegates to `daemonize-me`.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Daemonizer for SystemDaemonizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn daemonize(&self, plan: &DetachPlan<'_>) -> Result<DaemonContext, DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            workspace = %plan.workspace().display(),
            pid_file = %plan.pid_file().path().display(),
            "daemonising into background"
        );
        let mut daemon = Daemon::new();
        daemon = daemon.work_dir(plan.workspace());
        daemon = daemon.pid_file(plan.pid_file().path(), Some(false));
        daemon = daemon.name(OsStr::new(env!("CARGO_PKG_NAME")));
        // The parent exits inside `start`; only the detached child returns.
        daemon.start()?;
        info!(
            target: PROCESS_TARGET,
            pid = std::process::id(),
            "daemon process detached; continuing in child"
        );
        Ok(DaemonContext::new(plan.pid_file().clone()))
    }
}

#[cfg(not(unix))]
impl Daemonizer for SystemDaemonizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn daemonize(&self, plan: &DetachPlan<'_>) -> Result<DaemonContext, DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            pid_file = %plan.pid_file().path().display(),
            "background mode unavailable on this platform"
        );
        Err(DaemonizeError::Unsupported)
    }
}
