//! Test doubles shared by the lifecycle suites.

mod daemonizer;
mod main_routine;
mod process;
mod workspace;

pub use daemonizer::{FACILITY_PID, TestDaemonizer};
pub use main_routine::{MainRecorder, ScratchDir};
pub use process::MockProcess;
pub use workspace::CwdGuard;
