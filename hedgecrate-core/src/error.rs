//! Error types for hedgecrate

use thiserror::Error;

/// Main error type for hedgecrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Tessellation error: {0}")]
    Tessellation(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Result type alias for hedgecrate operations
pub type Result<T> = std::result::Result<T, Error>;
