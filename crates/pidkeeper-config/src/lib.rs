//! Shared configuration for the `pidkeeper` library and command-line tool.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file (`--config-path`), then `PIDKEEPER_*`
//! environment variables, then command-line flags. Only ambient concerns live
//! here; lifecycle parameters such as the PID file path are supplied per
//! invocation.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use ortho_config::OrthoError;

/// Resolved configuration for `pidkeeper`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PIDKEEPER")]
pub struct Config {
    /// `tracing` filter expression, for example `info` or `pidkeeper=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events written to stderr.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Config {
    /// Filter expression handed to the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}
