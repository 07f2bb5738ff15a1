//! Start/stop protocol over a PID file.
//!
//! `start` moves through `check conflict → clean stale → {detach | run in
//! the foreground → clean up}`. Detaching is terminal from the controller's
//! point of view: the daemonisation facility owns the PID file from then on,
//! so the two branches keep separate cleanup paths.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::pidfile::{PidFile, PidFileGuard};

use super::PROCESS_TARGET;
use super::daemonizer::{Daemonizer, DetachPlan, SystemDaemonizer};
use super::errors::{LifecycleError, MainError};
use super::control::{ProcessControl, StopSignal, SystemProcessControl};

/// Launch mode for the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaunchMode {
    /// Detach from the controlling terminal when the host supports it.
    #[default]
    Background,
    /// Block the caller until the main routine returns.
    Foreground,
}

/// Per-invocation parameters for [`Lifecycle::start`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    pid_file: Option<PathBuf>,
    mode: LaunchMode,
    workspace: Option<PathBuf>,
}

impl StartOptions {
    /// Options with no PID file, background mode, and the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the PID in `path`, resolved against the workspace.
    #[must_use]
    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    /// Selects the launch mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs inside `directory` instead of the current directory.
    #[must_use]
    pub fn with_workspace(mut self, directory: impl Into<PathBuf>) -> Self {
        self.workspace = Some(directory.into());
        self
    }

    /// Configured PID file; empty paths count as absent.
    #[must_use]
    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Requested launch mode.
    #[must_use]
    pub const fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// Requested workspace, if any.
    #[must_use]
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }
}

/// How a successful [`Lifecycle::start`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The main routine ran in the calling process and returned.
    Completed,
    /// The main routine ran in a detached process that owned the PID file.
    ///
    /// Only the detached process sees this outcome. The original process
    /// exits with status 0 during detachment, before the PID file is written,
    /// so later failures are visible only through the logs and the PID file.
    Detached,
}

/// Observed state of a service behind a PID file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// The recorded process exists.
    Running {
        /// Recorded PID.
        pid: u32,
    },
    /// A PID is recorded but no such process exists.
    Stale {
        /// Recorded PID.
        pid: u32,
    },
    /// No PID is recorded.
    Stopped,
}

/// Lifecycle controller wired to its process-table and detachment
/// collaborators.
#[derive(Debug, Default)]
pub struct Lifecycle<P = SystemProcessControl, D = SystemDaemonizer> {
    process: P,
    daemonizer: D,
}

impl Lifecycle {
    /// Controller using `kill(2)` and `daemonize-me`.
    #[must_use]
    pub const fn system() -> Self {
        Self::new(SystemProcessControl::new(), SystemDaemonizer::new())
    }
}

impl<P, D> Lifecycle<P, D>
where
    P: ProcessControl,
    D: Daemonizer,
{
    /// Builds a controller from explicit collaborators.
    pub const fn new(process: P, daemonizer: D) -> Self {
        Self {
            process,
            daemonizer,
        }
    }

    /// Runs `main` under the PID file protocol.
    ///
    /// When a workspace is configured the process working directory changes
    /// to it for the rest of the process lifetime, so `main` resolves its own
    /// relative paths there. In background mode this call returns only in the
    /// detached process.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`] without calling `main` when a
    /// live process holds the PID file, [`LifecycleError::Main`] after cleanup
    /// when `main` fails, and the underlying error for workspace, PID file,
    /// liveness check, or detachment failures.
    pub fn start<F, E>(&self, options: &StartOptions, main: F) -> Result<StartOutcome, LifecycleError>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<MainError>,
    {
        debug!(
            target: PROCESS_TARGET,
            pid_file = ?options.pid_file(),
            mode = ?options.mode(),
            workspace = ?options.workspace(),
            "start requested"
        );
        let workspace = enter_workspace(options.workspace())?;
        let pid_file = options
            .pid_file()
            .map(|path| PidFile::new(workspace.join(path)));

        if let Some(file) = pid_file.as_ref() {
            self.ensure_not_running(file)?;
            file.clean()?;
            if options.mode() == LaunchMode::Background && self.daemonizer.is_supported() {
                debug!(
                    target: PROCESS_TARGET,
                    pid_file = %file.path().display(),
                    "starting in background mode"
                );
                // The parent exits during detachment; surface an unwritable
                // PID file location while the caller can still see it.
                file.ensure_writable()?;
                let context = self
                    .daemonizer
                    .daemonize(&DetachPlan::new(&workspace, file))?;
                context.run(main)?;
                return Ok(StartOutcome::Detached);
            }
        }

        debug!(
            target: PROCESS_TARGET,
            pid = std::process::id(),
            "starting in foreground mode"
        );
        let guard = PidFileGuard::acquire(pid_file)?;
        run_guarded(guard, main)?;
        Ok(StartOutcome::Completed)
    }

    /// Sends the default stop signal (`SIGINT`) to the recorded process.
    ///
    /// # Errors
    ///
    /// See [`Lifecycle::stop_with`].
    pub fn stop(&self, pid_file: impl AsRef<Path>) -> Result<u32, LifecycleError> {
        self.stop_with(pid_file, StopSignal::default())
    }

    /// Sends `signal` to the recorded process and returns its PID.
    ///
    /// The PID file is left in place and the target is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotRunning`] when no PID is recorded, a PID
    /// file error when the file is unreadable or malformed, and
    /// [`LifecycleError::SignalFailed`] when delivery fails.
    pub fn stop_with(
        &self,
        pid_file: impl AsRef<Path>,
        signal: StopSignal,
    ) -> Result<u32, LifecycleError> {
        let file = PidFile::new(pid_file.as_ref());
        debug!(
            target: PROCESS_TARGET,
            pid_file = %file.path().display(),
            %signal,
            "stop requested"
        );
        let pid = file.load()?.ok_or_else(|| LifecycleError::NotRunning {
            path: file.path().to_path_buf(),
        })?;
        debug!(target: PROCESS_TARGET, pid, "loaded pid");
        self.process.signal(pid, signal)?;
        Ok(pid)
    }

    /// Reports whether the recorded process is alive.
    ///
    /// # Errors
    ///
    /// Returns a PID file error when the file is unreadable or malformed, and
    /// [`LifecycleError::CheckProcess`] when the liveness check fails.
    pub fn status(&self, pid_file: impl AsRef<Path>) -> Result<ServiceStatus, LifecycleError> {
        let file = PidFile::new(pid_file.as_ref());
        let Some(pid) = file.load()? else {
            return Ok(ServiceStatus::Stopped);
        };
        if self.process.is_running(pid)? {
            Ok(ServiceStatus::Running { pid })
        } else {
            Ok(ServiceStatus::Stale { pid })
        }
    }

    fn ensure_not_running(&self, file: &PidFile) -> Result<(), LifecycleError> {
        let Some(pid) = file.load()? else {
            return Ok(());
        };
        if self.process.is_running(pid)? {
            error!(
                target: PROCESS_TARGET,
                pid,
                pid_file = %file.path().display(),
                "refusing to start: service already running"
            );
            return Err(LifecycleError::AlreadyRunning { pid });
        }
        warn!(
            target: PROCESS_TARGET,
            pid,
            pid_file = %file.path().display(),
            "recorded process not running; cleaning stale pid file"
        );
        Ok(())
    }
}

/// Runs `main` and removes the guarded PID file on every exit path.
///
/// Failures from `main` take precedence over cleanup failures, which the
/// guard logs when it is dropped.
pub(super) fn run_guarded<F, E>(guard: PidFileGuard, main: F) -> Result<(), LifecycleError>
where
    F: FnOnce() -> Result<(), E>,
    E: Into<MainError>,
{
    match main() {
        Ok(()) => {
            guard.release()?;
            Ok(())
        }
        Err(error) => {
            drop(guard);
            Err(LifecycleError::Main {
                source: error.into(),
            })
        }
    }
}

fn enter_workspace(requested: Option<&Path>) -> Result<PathBuf, LifecycleError> {
    let current = env::current_dir().map_err(|source| LifecycleError::Workspace {
        path: requested.map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        source,
    })?;
    let Some(directory) = requested else {
        return Ok(current);
    };
    let resolved = current.join(directory);
    env::set_current_dir(&resolved).map_err(|source| LifecycleError::Workspace {
        path: resolved.clone(),
        source,
    })?;
    debug!(
        target: PROCESS_TARGET,
        workspace = %resolved.display(),
        "entered workspace"
    );
    Ok(resolved)
}
