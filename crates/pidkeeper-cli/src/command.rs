//! Runs the supervised program as the lifecycle's main routine.
//!
//! While the program runs, stop signals delivered to `pidkeeper` are relayed
//! to it. A program that exits after such a relay has stopped on request and
//! counts as a clean exit; every other non-zero exit is a failure.

use std::ffi::OsString;
use std::io;
use std::process::{Child, Command, ExitStatus};
#[cfg(unix)]
use std::sync::Arc;
#[cfg(unix)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::thread;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info, warn};

const COMMAND_TARGET: &str = "pidkeeper::command";

#[cfg(unix)]
const FORWARDED_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// Errors raised while running the supervised program.
#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("failed to install signal forwarding: {source}")]
    InstallSignals {
        #[source]
        source: io::Error,
    },
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited unsuccessfully ({status})")]
    Exited { program: String, status: ExitStatus },
}

/// Program and arguments supplied after `start`.
#[derive(Debug, Clone)]
pub(crate) struct ChildCommand {
    program: OsString,
    arguments: Vec<OsString>,
}

impl ChildCommand {
    pub(crate) fn new(program: OsString, arguments: Vec<OsString>) -> Self {
        Self { program, arguments }
    }

    fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn spawn(&self) -> Result<Child, CommandError> {
        let child = Command::new(&self.program)
            .args(&self.arguments)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: self.display_name(),
                source,
            })?;
        info!(
            target: COMMAND_TARGET,
            program = %self.display_name(),
            child = child.id(),
            "program started"
        );
        Ok(child)
    }

    fn finish(&self, status: ExitStatus, stopped_on_request: bool) -> Result<(), CommandError> {
        debug!(
            target: COMMAND_TARGET,
            program = %self.display_name(),
            %status,
            stopped_on_request,
            "program exited"
        );
        if status.success() || stopped_on_request {
            Ok(())
        } else {
            Err(CommandError::Exited {
                program: self.display_name(),
                status,
            })
        }
    }

    /// Runs the program to completion, relaying stop signals to it.
    #[cfg(unix)]
    pub(crate) fn run(self) -> Result<(), CommandError> {
        // Handlers go in before the spawn so an early stop is relayed rather
        // than terminating `pidkeeper` and orphaning the program.
        let mut signals = Signals::new(FORWARDED_SIGNALS)
            .map_err(|source| CommandError::InstallSignals { source })?;
        let mut child = self.spawn()?;
        let child_pid = child.id();
        let relayed = Arc::new(AtomicBool::new(false));
        let handle = signals.handle();
        let forwarder = {
            let relayed = Arc::clone(&relayed);
            thread::spawn(move || {
                for signal in signals.forever() {
                    relay(child_pid, signal, &relayed);
                }
            })
        };

        let waited = child.wait();
        handle.close();
        if forwarder.join().is_err() {
            warn!(target: COMMAND_TARGET, "signal forwarder panicked");
        }
        let status = waited.map_err(|source| CommandError::Wait {
            program: self.display_name(),
            source,
        })?;
        self.finish(status, relayed.load(Ordering::SeqCst))
    }

    /// Runs the program to completion.
    #[cfg(not(unix))]
    pub(crate) fn run(self) -> Result<(), CommandError> {
        let mut child = self.spawn()?;
        let status = child.wait().map_err(|source| CommandError::Wait {
            program: self.display_name(),
            source,
        })?;
        self.finish(status, false)
    }
}

/// Sends `signal` to the program, marking the stop as requested only when
/// the signal was delivered.
#[cfg(unix)]
fn relay(child_pid: u32, signal: i32, relayed: &AtomicBool) {
    let Ok(pid) = libc::pid_t::try_from(child_pid) else {
        warn!(target: COMMAND_TARGET, child = child_pid, signal, "child pid out of range");
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions; `pid` is the child's
    // positive identifier.
    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        relayed.store(true, Ordering::SeqCst);
        info!(target: COMMAND_TARGET, child = child_pid, signal, "signal relayed");
    } else {
        let error = io::Error::last_os_error();
        warn!(
            target: COMMAND_TARGET,
            child = child_pid,
            signal,
            error = %error,
            "failed to relay signal"
        );
    }
}
