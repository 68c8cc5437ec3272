//! Custom error types for the crate.
//!
//! This module defines the primary error type, `AdvError`. Using the `thiserror` crate, it
//! provides one place for every failure the turbulence pipeline and its adapters can report.
//!
//! ## Error Hierarchy
//!
//! The numeric core only ever produces four variants:
//!
//! - **`InvalidParameter`**: a caller-supplied value (probe offset, z threshold, flume
//!   geometry) violates its precondition. Raised before any computation runs.
//! - **`InsufficientData`**: a channel has no valid (unmasked) samples where a mean or
//!   standard deviation is required.
//! - **`Alignment`**: two series that must share a timestamp index do not. This points at a
//!   loader bug; series are never truncated or padded to make them fit.
//! - **`InvalidIndex`**: a timestamp index is not finite and strictly increasing.
//!
//! The remaining variants come from the adapters around the core (configuration, CSV and
//! NetCDF tables) and from the command-line front end.
//!
//! None of these failures are transient, so nothing in the crate retries.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, AdvError>;

/// Every error the crate can report.
#[derive(Error, Debug)]
pub enum AdvError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Insufficient data: channel '{channel}' has no valid samples")]
    InsufficientData { channel: String },

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Invalid timestamp index: {0}")]
    InvalidIndex(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "storage_csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "storage_netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::error::Error),

    #[error("Missing field '{0}' in input table")]
    MissingField(String),

    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),
}

impl AdvError {
    /// Builds an `InvalidParameter` error from a parameter name and a validation message.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AdvError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Builds an `InsufficientData` error for the named channel.
    pub fn insufficient(channel: impl Into<String>) -> Self {
        AdvError::InsufficientData {
            channel: channel.into(),
        }
    }
}

impl From<figment::Error> for AdvError {
    fn from(value: figment::Error) -> Self {
        AdvError::Config(Box::new(value))
    }
}
