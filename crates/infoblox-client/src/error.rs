//! Infoblox client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Infoblox WAPI
#[derive(Debug, Error)]
pub enum InfobloxError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WAPI returned an error
    #[error("Infoblox API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (bad credentials, locked account, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
