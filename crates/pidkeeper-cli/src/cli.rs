//! CLI argument definitions for `pidkeeper`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pidkeeper::StopSignal;

/// Runs a program under a PID file and controls it later.
#[derive(Parser, Debug)]
#[command(name = "pidkeeper", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Lifecycle command to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Lifecycle commands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Runs PROGRAM, recording its supervisor's PID in the PID file.
    Start {
        /// PID file used for the conflict check and later `stop`.
        #[arg(long, value_name = "PATH")]
        pidfile: Option<PathBuf>,
        /// Blocks until the program exits instead of detaching.
        #[arg(long)]
        foreground: bool,
        /// Directory to run in; relative PID file paths resolve against it.
        #[arg(long, value_name = "DIR")]
        workspace: Option<PathBuf>,
        /// Program to run.
        #[arg(value_name = "PROGRAM", required = true)]
        program: OsString,
        /// Arguments passed to the program.
        #[arg(
            value_name = "ARG",
            num_args = 0..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<OsString>,
    },
    /// Signals the process recorded in the PID file.
    Stop {
        /// PID file written by `start`.
        #[arg(long, value_name = "PATH")]
        pidfile: PathBuf,
        /// Signal to deliver (INT, TERM, HUP or QUIT).
        #[arg(long, value_name = "NAME", default_value_t = StopSignal::Interrupt)]
        signal: StopSignal,
    },
    /// Reports whether the process recorded in the PID file is alive.
    Status {
        /// PID file written by `start`.
        #[arg(long, value_name = "PATH")]
        pidfile: PathBuf,
    },
}
