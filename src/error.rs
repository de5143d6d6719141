//! Error types for the service surface.
//!
//! Line calculation itself is infallible; these errors cover loading
//! configuration, binding the server and rejecting malformed requests.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
