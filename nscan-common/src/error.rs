//! Common error types for NeuroScan

use thiserror::Error;

/// Common result type for NeuroScan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the diagnosis subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Downstream collaborator (inference endpoint, storage) failed or timed out
    #[error("Downstream unavailable: {0}")]
    Unavailable(String),

    /// Stored payload could not be decoded on read
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
