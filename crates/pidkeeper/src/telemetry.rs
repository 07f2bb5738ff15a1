//! Installs the process-wide `tracing` subscriber.
//!
//! Events are written to stderr with RFC 3339 UTC timestamps, filtered by the
//! configured `EnvFilter` expression. The subscriber is installed at most once
//! per process. A detached daemon keeps the subscriber it inherited across the
//! fork; by then the daemonisation facility has pointed stderr at `/dev/null`.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::{self, MakeWriter, time::UtcTime};
use tracing_subscriber::EnvFilter;

use pidkeeper_config::{Config, LogFormat};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser diagnostic.
        #[source]
        source: ParseError,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls leave the installed subscriber alone and report the format it
/// was installed with, even when `config` asks for another.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter expression and
/// [`TelemetryError::Subscriber`] when another subscriber is already global.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = INSTALLED.get_or_try_init(|| {
        let subscriber = build_subscriber(config, io::stderr, io::stderr().is_terminal())?;
        tracing::subscriber::set_global_default(subscriber)?;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format: *format })
}

fn build_subscriber<W>(
    config: &Config,
    writer: W,
    ansi: bool,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(config.log_filter()).map_err(|source| {
        TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            source,
        }
    })?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer)
        .with_timer(UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).with_ansi(false).finish()),
        LogFormat::Compact => Box::new(builder.compact().with_ansi(ansi).finish()),
    })
}
