//! CLI entrypoint for `pidkeeper`.
//!
//! The binary delegates to [`pidkeeper_cli::run`], which loads configuration,
//! installs logging, and runs the requested lifecycle command.
//!
//! The standard streams are passed unlocked: the installed subscriber writes
//! to stderr from the signal relay thread while `main` waits on the program.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    pidkeeper_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
