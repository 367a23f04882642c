// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Native status codes are NOT errors here: they are reported through
/// `ProbeOutcome`. This type covers failures of the harness itself.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
