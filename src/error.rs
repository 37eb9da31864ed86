// ABOUTME: Application-wide error type aggregating module errors.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::container::ContainerError;
use crate::health::HealthError;
use crate::process::ProcessError;
use crate::reloader::ReloaderError;
use crate::stack::StackError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot {operation} environment as it is not up")]
    NotUp { operation: &'static str },

    #[error(
        "environment was up only temporarily and its state changed after running up hooks!\n{details}"
    )]
    Unstable { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Health(#[from] HealthError),

    #[error(transparent)]
    Reloader(#[from] ReloaderError),
}

pub type Result<T> = std::result::Result<T, Error>;
