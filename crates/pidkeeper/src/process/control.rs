//! Liveness queries and signal delivery for recorded PIDs.

use strum::{Display, EnumString};
#[cfg(unix)]
use tracing::info;

use super::errors::LifecycleError;
#[cfg(unix)]
use super::PROCESS_TARGET;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{Signal, kill};
#[cfg(unix)]
use nix::unistd::Pid;

/// Signal sent to request that a service stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum StopSignal {
    /// `SIGINT`; the default, equivalent to an interactive interrupt.
    #[default]
    #[strum(to_string = "SIGINT", serialize = "INT")]
    Interrupt,
    /// `SIGTERM`.
    #[strum(to_string = "SIGTERM", serialize = "TERM")]
    Terminate,
    /// `SIGHUP`.
    #[strum(to_string = "SIGHUP", serialize = "HUP")]
    Hangup,
    /// `SIGQUIT`.
    #[strum(to_string = "SIGQUIT", serialize = "QUIT")]
    Quit,
}

/// Errors encountered while parsing a [`StopSignal`] from text.
pub type StopSignalParseError = strum::ParseError;

#[cfg(unix)]
impl StopSignal {
    const fn as_nix(self) -> Signal {
        match self {
            Self::Interrupt => Signal::SIGINT,
            Self::Terminate => Signal::SIGTERM,
            Self::Hangup => Signal::SIGHUP,
            Self::Quit => Signal::SIGQUIT,
        }
    }
}

/// Host process table operations used by the lifecycle controller.
pub trait ProcessControl: Send + Sync {
    /// Reports whether a process with `pid` currently exists.
    ///
    /// Zombies and processes that are shutting down count as running.
    fn is_running(&self, pid: u32) -> Result<bool, LifecycleError>;

    /// Requests delivery of `signal` to `pid` without waiting for an effect.
    fn signal(&self, pid: u32, signal: StopSignal) -> Result<(), LifecycleError>;
}

/// Process control backed by `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    /// Builds the system process controller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> Result<bool, LifecycleError> {
        let Ok(target) = addressable_pid(pid) else {
            return Ok(false);
        };
        match kill(target, None) {
            Ok(()) | Err(Errno::EPERM) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(errno) => Err(LifecycleError::CheckProcess {
                pid,
                source: errno.into(),
            }),
        }
    }

    fn signal(&self, pid: u32, signal: StopSignal) -> Result<(), LifecycleError> {
        let target = addressable_pid(pid)?;
        kill(target, signal.as_nix()).map_err(|errno| LifecycleError::SignalFailed {
            pid,
            signal,
            source: errno.into(),
        })?;
        info!(
            target: PROCESS_TARGET,
            pid,
            %signal,
            "signal delivered"
        );
        Ok(())
    }
}

#[cfg(not(unix))]
impl ProcessControl for SystemProcessControl {
    fn is_running(&self, _pid: u32) -> Result<bool, LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }

    fn signal(&self, _pid: u32, _signal: StopSignal) -> Result<(), LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }
}

/// Converts a recorded PID into a single-process `kill(2)` target.
///
/// Zero and values above `i32::MAX` would address process groups instead.
#[cfg(unix)]
fn addressable_pid(pid: u32) -> Result<Pid, LifecycleError> {
    if pid == 0 {
        return Err(LifecycleError::InvalidPid {
            pid,
            reason: "pid 0 addresses the caller's process group",
        });
    }
    let raw = i32::try_from(pid).map_err(|_| LifecycleError::InvalidPid {
        pid,
        reason: "pid exceeds i32::MAX",
    })?;
    Ok(Pid::from_raw(raw))
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::Command;

    use rstest::rstest;

    use super::*;

    #[test]
    fn current_process_is_running() {
        let running = SystemProcessControl::new()
            .is_running(std::process::id())
            .expect("liveness check should succeed");
        assert!(running);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::beyond_pid_range(u32::MAX)]
    fn unaddressable_pids_are_not_running(#[case] pid: u32) {
        let running = SystemProcessControl::new()
            .is_running(pid)
            .expect("liveness check should succeed");
        assert!(!running);
    }

    #[rstest]
    #[case::pid_zero(0, "process group")]
    #[case::pid_exceeds_i32_max((i32::MAX as u32) + 1, "exceeds")]
    fn signal_rejects_invalid_pid(#[case] invalid_pid: u32, #[case] expected_reason: &str) {
        let result = SystemProcessControl::new().signal(invalid_pid, StopSignal::Interrupt);
        let Err(LifecycleError::InvalidPid { pid, reason }) = result else {
            panic!("expected InvalidPid, got {result:?}");
        };
        assert_eq!(pid, invalid_pid);
        assert!(
            reason.contains(expected_reason),
            "expected reason to contain '{expected_reason}', got '{reason}'"
        );
    }

    #[test]
    fn signal_fails_for_nonexistent_pid() {
        // PID 99999999 is above every Linux pid_max and unlikely elsewhere.
        let result = SystemProcessControl::new().signal(99_999_999, StopSignal::Terminate);
        let Err(LifecycleError::SignalFailed { pid, signal, source }) = result else {
            panic!("expected SignalFailed, got {result:?}");
        };
        assert_eq!(pid, 99_999_999);
        assert_eq!(signal, StopSignal::Terminate);
        assert_eq!(source.raw_os_error(), Some(Errno::ESRCH as i32));
    }

    #[test]
    fn interrupted_child_stops_running() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("sleep should spawn");
        let control = SystemProcessControl::new();
        let pid = child.id();
        assert!(control.is_running(pid).expect("liveness check should succeed"));

        control
            .signal(pid, StopSignal::Interrupt)
            .expect("signal should be delivered");
        // Reap the child; until then `kill(pid, 0)` still sees the zombie.
        let status = child.wait().expect("child should be reaped");

        assert!(!status.success());
        assert!(!control.is_running(pid).expect("liveness check should succeed"));
    }

    #[rstest]
    #[case("INT", StopSignal::Interrupt)]
    #[case("sigint", StopSignal::Interrupt)]
    #[case("TERM", StopSignal::Terminate)]
    #[case("SIGHUP", StopSignal::Hangup)]
    #[case("quit", StopSignal::Quit)]
    fn parses_signal_names(#[case] text: &str, #[case] expected: StopSignal) {
        assert_eq!(text.parse::<StopSignal>().expect("signal should parse"), expected);
    }

    #[test]
    fn default_signal_is_interrupt() {
        assert_eq!(StopSignal::default(), StopSignal::Interrupt);
        assert_eq!(StopSignal::default().to_string(), "SIGINT");
    }
}
