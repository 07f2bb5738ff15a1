//! Entry points that terminate the process on reserved lifecycle outcomes.
//!
//! Wrapper binaries call these instead of [`Lifecycle`] when they want the
//! conventional exit statuses: 95 when `start` finds a live holder of the PID
//! file and 195 when `stop` finds no PID on record.

use std::io::{self, Write};
use std::path::Path;
use std::process;

use tracing::error;

use super::PROCESS_TARGET;
use super::controller::{Lifecycle, ServiceStatus, StartOptions, StartOutcome};
use super::errors::{LifecycleError, MainError};
use super::control::StopSignal;

/// Starts `main` with the system collaborators.
///
/// Exits the process with status 95 when the PID file names a live process.
///
/// # Errors
///
/// Returns every [`LifecycleError`] without a reserved exit status.
pub fn start<F, E>(options: &StartOptions, main: F) -> Result<StartOutcome, LifecycleError>
where
    F: FnOnce() -> Result<(), E>,
    E: Into<MainError>,
{
    exit_on_reserved(Lifecycle::system().start(options, main))
}

/// Sends `SIGINT` to the process recorded in `pid_file`.
///
/// Exits the process with status 195 when no PID is recorded.
///
/// # Errors
///
/// Returns every [`LifecycleError`] without a reserved exit status.
pub fn stop(pid_file: impl AsRef<Path>) -> Result<u32, LifecycleError> {
    stop_with(pid_file, StopSignal::default())
}

/// Sends `signal` to the process recorded in `pid_file`.
///
/// Exits the process with status 195 when no PID is recorded.
///
/// # Errors
///
/// Returns every [`LifecycleError`] without a reserved exit status.
pub fn stop_with(pid_file: impl AsRef<Path>, signal: StopSignal) -> Result<u32, LifecycleError> {
    exit_on_reserved(Lifecycle::system().stop_with(pid_file, signal))
}

/// Reports the state of the process recorded in `pid_file`.
///
/// # Errors
///
/// See [`Lifecycle::status`].
pub fn status(pid_file: impl AsRef<Path>) -> Result<ServiceStatus, LifecycleError> {
    Lifecycle::system().status(pid_file)
}

fn exit_on_reserved<T>(result: Result<T, LifecycleError>) -> Result<T, LifecycleError> {
    let error = match result {
        Ok(value) => return Ok(value),
        Err(error) => error,
    };
    let Some(code) = error.reserved_exit_code() else {
        return Err(error);
    };
    error!(
        target: PROCESS_TARGET,
        code,
        error = %error,
        "terminating with reserved exit status"
    );
    let mut stderr = io::stderr().lock();
    // The process exits next; a failed write has nowhere left to go.
    let _ = writeln!(stderr, "{error}");
    let _ = stderr.flush();
    process::exit(i32::from(code))
}
