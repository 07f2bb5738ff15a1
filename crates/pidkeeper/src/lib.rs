//! Daemon lifecycle control over a PID file.
//!
//! `pidkeeper` launches an application's main routine either in the
//! foreground, blocking the caller, or detached into the background, and
//! records the running process's identifier in a PID file so that a later,
//! unrelated invocation can query or stop it.
//!
//! The protocol is deliberately small:
//!
//! - `start` refuses to run when the PID file names a live process, removes
//!   stale PID files, and guarantees that the PID file it owns is removed when
//!   the main routine returns, fails, or panics.
//! - `stop` reads the PID file and sends a signal (`SIGINT` by default). It
//!   does not wait for the target and does not remove the PID file.
//!
//! There is no locking: two concurrent `start` calls on the same PID file race
//! and the last writer wins. Callers needing strict exclusivity must add their
//! own lock.
//!
//! [`Lifecycle`] returns every outcome as a [`LifecycleError`]. The free
//! functions [`start`] and [`stop`] use the system collaborators and terminate
//! the process with the reserved exit statuses
//! ([`ALREADY_RUNNING_EXIT_CODE`], [`NOT_RUNNING_EXIT_CODE`]).

pub mod pidfile;
mod process;
pub mod telemetry;

pub use pidfile::{PidFile, PidFileError, PidFileGuard};
pub use process::{
    ALREADY_RUNNING_EXIT_CODE, DaemonContext, DaemonizeError, Daemonizer, DetachPlan,
    LaunchMode, Lifecycle, LifecycleError, MainError, NOT_RUNNING_EXIT_CODE, ProcessControl,
    ServiceStatus, StartOptions, StartOutcome, StopSignal, StopSignalParseError,
    SystemDaemonizer, SystemProcessControl, start, status, stop, stop_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
