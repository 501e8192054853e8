//! Client error types

use thiserror::Error;

/// Cart storage errors
#[derive(Debug, Error)]
pub enum CartError {
    /// The durable slot has not been restored yet; mutating now could
    /// overwrite the saved cart with an empty default.
    #[error("Cart not loaded from durable storage yet")]
    NotLoaded,

    #[error("Cart storage error: {0}")]
    Storage(String),
}

/// API client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
