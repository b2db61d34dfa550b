//! Error types for landreg

use thiserror::Error;

/// Main error type for landreg operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("No successful registration has been computed yet")]
    NotRegistered,

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for landreg operations
pub type Result<T> = std::result::Result<T, Error>;
