//! Defines the unified error surface for lifecycle control.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pidfile::PidFileError;

use super::daemonizer::DaemonizeError;
use super::control::StopSignal;
use super::{ALREADY_RUNNING_EXIT_CODE, NOT_RUNNING_EXIT_CODE};

/// Boxed failure reported by the application's main routine.
pub type MainError = Box<dyn Error + Send + Sync + 'static>;

/// Errors surfaced while starting, stopping, or checking on a service.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A live process already holds the PID file.
    #[error("service is already running in process {pid}")]
    AlreadyRunning {
        /// PID recorded in the existing PID file.
        pid: u32,
    },
    /// No PID is recorded, so there is nothing to stop.
    #[error("service is not running (no pid recorded in '{path}')")]
    NotRunning {
        /// PID file that was consulted.
        path: PathBuf,
    },
    /// The workspace could not be resolved or entered.
    #[error("failed to enter workspace '{path}': {source}")]
    Workspace {
        /// Requested workspace directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading, writing, or removing the PID file failed.
    #[error(transparent)]
    PidFile(#[from] PidFileError),
    /// Checking an existing PID failed.
    #[error("failed to check existing process {pid}: {source}")]
    CheckProcess {
        /// PID whose liveness check failed.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The PID cannot be addressed safely with a signal.
    #[error("refusing to signal pid {pid}: {reason}")]
    InvalidPid {
        /// Rejected PID.
        pid: u32,
        /// Why the PID was rejected.
        reason: &'static str,
    },
    /// Signal delivery failed.
    #[error("failed to send {signal} to process {pid}: {source}")]
    SignalFailed {
        /// Target PID.
        pid: u32,
        /// Signal that could not be delivered.
        signal: StopSignal,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Detaching into the background failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// The application's main routine failed.
    #[error("{source}")]
    Main {
        /// Error returned by the main routine, unchanged.
        #[source]
        source: MainError,
    },
    /// Process control is unavailable on this host.
    #[error("process control is not supported on this platform")]
    UnsupportedPlatform,
}

impl LifecycleError {
    /// Exit status reserved for this error, if any.
    ///
    /// `AlreadyRunning` maps to 95 and `NotRunning` to 195; every other
    /// variant leaves the choice to the caller.
    #[must_use]
    pub const fn reserved_exit_code(&self) -> Option<u8> {
        match self {
            Self::AlreadyRunning { .. } => Some(ALREADY_RUNNING_EXIT_CODE),
            Self::NotRunning { .. } => Some(NOT_RUNNING_EXIT_CODE),
            _ => None,
        }
    }
}

impl From<DaemonizeError> for LifecycleError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}
