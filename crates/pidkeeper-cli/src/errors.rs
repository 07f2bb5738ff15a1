//! Error types for the CLI runtime.

use std::sync::Arc;

use pidkeeper::{LifecycleError, TelemetryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("failed to write command output: {0}")]
    Output(#[source] std::io::Error),
}
