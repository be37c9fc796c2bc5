//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// Wraps the specific error taxonomies and provides a single
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Network(NetworkError),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors.
///
/// All of these are fatal: they are raised while building the engine
/// configuration at startup, before the submission loop begins.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid node URL format: '{url}'")]
    InvalidNodeUrl { url: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid trytes for '{field}': expected {expected}, got '{got}'")]
    InvalidTrytes {
        field: String,
        expected: String,
        got: String,
    },

    #[error("Checksum mismatch for address '{address}'")]
    ChecksumMismatch { address: String },
}

/// Network and node-API errors.
///
/// Everything in here is recovered locally by the submission loop:
/// logged, the iteration abandoned, and the loop restarted.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Node rejected request at {endpoint}: {reason}")]
    NodeRejected { endpoint: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },
}
