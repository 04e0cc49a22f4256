use flow_profile_core::FlowError;
use thiserror::Error;

use crate::instance::InstanceError;

pub(crate) type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Failed to read file {1}, more details: {0}")]
    FileReadingError(std::io::Error, String),
    #[error("The instance was invalid: {0}")]
    InvalidInstance(#[from] InstanceError),
    #[error("Failed to build the profile: {0}")]
    Flow(#[from] FlowError),
}
