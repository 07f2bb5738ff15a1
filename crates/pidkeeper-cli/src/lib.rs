//! Command-line runtime for `pidkeeper`.
//!
//! The module owns argument parsing, configuration bootstrapping, and
//! dispatch to the lifecycle library. `start` runs an external program as the
//! application's main routine. Reserved outcomes terminate the process inside
//! the library: 95 when `start` finds a live holder of the PID file and 195
//! when `stop` finds no PID on record. `status` reuses 195 for anything other
//! than a running process.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use pidkeeper::{
    LaunchMode, NOT_RUNNING_EXIT_CODE, ServiceStatus, StartOptions, telemetry,
};
use pidkeeper_config::Config;
use tracing::debug;

mod cli;
mod command;
mod config;
mod errors;

use cli::{Cli, CliCommand};
use command::ChildCommand;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

const CLI_TARGET: &str = "pidkeeper::cli";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| install_telemetry(&config))
        .and_then(|()| execute(cli.command, stdout));

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if error.use_stderr() {
        let _ = write!(stderr, "{rendered}");
    } else {
        let _ = write!(stdout, "{rendered}");
    }
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn install_telemetry(config: &Config) -> Result<(), AppError> {
    telemetry::initialise(config)?;
    Ok(())
}

fn execute<W: Write>(command: CliCommand, stdout: &mut W) -> Result<ExitCode, AppError> {
    debug!(target: CLI_TARGET, ?command, "dispatching command");
    match command {
        CliCommand::Start {
            pidfile,
            foreground,
            workspace,
            program,
            arguments,
        } => {
            let mut options = StartOptions::new().with_mode(if foreground {
                LaunchMode::Foreground
            } else {
                LaunchMode::Background
            });
            if let Some(path) = pidfile {
                options = options.with_pid_file(path);
            }
            if let Some(directory) = workspace {
                options = options.with_workspace(directory);
            }
            let child = ChildCommand::new(program, arguments);
            let outcome = pidkeeper::start(&options, move || child.run())?;
            debug!(target: CLI_TARGET, ?outcome, "start finished");
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Stop { pidfile, signal } => {
            let pid = pidkeeper::stop_with(&pidfile, signal)?;
            writeln!(stdout, "{pid}").map_err(AppError::Output)?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Status { pidfile } => {
            let status = pidkeeper::status(&pidfile)?;
            let (line, exit_code) = match status {
                ServiceStatus::Running { pid } => (format!("running {pid}"), ExitCode::SUCCESS),
                ServiceStatus::Stale { pid } => (
                    format!("stale {pid}"),
                    ExitCode::from(NOT_RUNNING_EXIT_CODE),
                ),
                ServiceStatus::Stopped => (
                    "not running".to_owned(),
                    ExitCode::from(NOT_RUNNING_EXIT_CODE),
                ),
            };
            writeln!(stdout, "{line}").map_err(AppError::Output)?;
            Ok(exit_code)
        }
    }
}
