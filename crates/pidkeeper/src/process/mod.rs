//! Process lifecycle: conflict detection, foreground and background runs,
//! and signal-driven stop over a PID file.

mod controller;
pub(crate) mod daemonizer;
mod entry;
mod errors;
pub(crate) mod control;

pub use controller::{Lifecycle, LaunchMode, ServiceStatus, StartOptions, StartOutcome};
pub use daemonizer::{DaemonContext, DaemonizeError, Daemonizer, DetachPlan, SystemDaemonizer};
pub use entry::{start, status, stop, stop_with};
pub use errors::{LifecycleError, MainError};
pub use control::{ProcessControl, StopSignal, StopSignalParseError, SystemProcessControl};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Exit status used when `start` finds a live process holding the PID file.
pub const ALREADY_RUNNING_EXIT_CODE: u8 = 95;

/// Exit status used when `stop` finds no PID on record.
pub const NOT_RUNNING_EXIT_CODE: u8 = 195;
