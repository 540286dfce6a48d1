//! Cleanup engine
//!
//! Releases the Infoblox records listed in a deleted machine's annotation.

use crate::annotation::split_references;
use crate::error::WebhookError;
use capv_types::VSphereMachine;
use infoblox_client::InfobloxClientTrait;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Releases recorded allocations, in the order they were made
pub struct CleanupEngine {
    client: Arc<dyn InfobloxClientTrait>,
    annotation: String,
}

impl CleanupEngine {
    pub fn new(client: Arc<dyn InfobloxClientTrait>, annotation: impl Into<String>) -> Self {
        Self {
            client,
            annotation: annotation.into(),
        }
    }

    /// Release every referenced record and drop the annotation.
    ///
    /// Stops at the first failed release and leaves the annotation as it
    /// was, so a retried delete releases everything again. Returns the
    /// number of records released.
    pub async fn release(&self, machine: &mut VSphereMachine) -> Result<usize, WebhookError> {
        let Some(value) = machine.annotation(&self.annotation).map(str::to_string) else {
            return Ok(0);
        };

        let references = split_references(&value);
        for reference in &references {
            if let Err(e) = self.client.release_record(reference).await {
                warn!("Failed to release {}: {}", reference, e);
                return Err(e.into());
            }
            info!("Released {}", reference);
        }

        machine.annotations_mut().remove(&self.annotation);
        Ok(references.len())
    }
}
