use thiserror::Error;

use crate::{
    collector::TelemetryError, config::ConfigError, reporter::OutputError,
};

// The main program error type
#[derive(Debug, Error)]
pub enum NvsmiError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Output(#[from] OutputError),
}
