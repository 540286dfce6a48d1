//! InfobloxClient trait for mocking
//!
//! This trait is the IPAM capability the webhook depends on. The concrete
//! `InfobloxClient` implements it, and tests use `MockInfobloxClient`.

use crate::error::InfobloxError;
use crate::models::{RecordA, RecordRequest};

/// Trait for Infoblox IPAM operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InfobloxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Reserve the next available address in `request.cidr` and create an A
    /// record for it. Returns the record with its resolved address and
    /// opaque reference.
    async fn allocate_record(&self, request: &RecordRequest) -> Result<RecordA, InfobloxError>;

    /// Delete a record previously returned by `allocate_record`.
    async fn release_record(&self, reference: &str) -> Result<(), InfobloxError>;
}
