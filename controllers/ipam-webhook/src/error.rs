//! Webhook-specific error types.
//!
//! Engine errors propagate unchanged to the gatekeeper, which is the only
//! place they are turned into admission responses via `status_code`.

use crate::marker::MarkerError;
use infoblox_client::InfobloxError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the IPAM webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Infoblox API error
    #[error("Infoblox error: {0}")]
    Infoblox(#[from] InfobloxError),

    /// Admission object missing or not a VSphereMachine
    #[error("failed to decode object: {0}")]
    Decode(String),

    /// Interface address carries the prefix but is not a valid marker
    #[error("invalid IPAM marker: {0}")]
    Marker(#[from] MarkerError),

    /// Admission operation other than CREATE or DELETE
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Infoblox returned a reference that cannot be stored in the annotation
    #[error("invalid record reference from Infoblox: {0}")]
    InvalidReference(String),

    /// Admission patch could not be built
    #[error("failed to build patch: {0}")]
    Patch(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Listener error
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl WebhookError {
    /// HTTP-style status code reported in a denied admission response
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::Decode(_) | WebhookError::Marker(_) => 400,
            _ => 500,
        }
    }
}
