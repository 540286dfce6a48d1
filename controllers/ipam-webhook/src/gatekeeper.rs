//! Admission gatekeeper
//!
//! Decides what to do with each admission request and is the only place
//! where errors become admission responses. CREATE resolves IPAM markers and
//! answers with a JSON patch; DELETE releases the recorded references.

use crate::allocation::AllocationEngine;
use crate::cleanup::CleanupEngine;
use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::marker::MarkerParser;
use capv_types::VSphereMachine;
use infoblox_client::InfobloxClientTrait;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, Operation};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of a successfully handled request
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Admit unchanged
    Allowed,
    /// Admit with these changes
    Patched(json_patch::Patch),
}

pub struct Gatekeeper {
    parser: MarkerParser,
    allocation: AllocationEngine,
    cleanup: CleanupEngine,
    annotation: String,
}

impl Gatekeeper {
    pub fn new(client: Arc<dyn InfobloxClientTrait>, config: &WebhookConfig) -> Self {
        let parser = MarkerParser::new(config.prefix.clone());
        Self {
            allocation: AllocationEngine::new(
                client.clone(),
                parser.clone(),
                config.annotation.clone(),
            ),
            cleanup: CleanupEngine::new(client, config.annotation.clone()),
            parser,
            annotation: config.annotation.clone(),
        }
    }

    /// Handle one admission request and build its response
    #[instrument(
        name = "admission",
        skip_all,
        fields(uid = %request.uid, operation = ?request.operation, name = %request.name)
    )]
    pub async fn review(&self, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        match self.decide(request).await {
            Ok(Verdict::Allowed) => AdmissionResponse::from(request),
            Ok(Verdict::Patched(patch)) => match AdmissionResponse::from(request).with_patch(patch) {
                Ok(response) => response,
                Err(e) => deny(request, &WebhookError::Patch(e.to_string())),
            },
            Err(e) => deny(request, &e),
        }
    }

    pub async fn decide(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<Verdict, WebhookError> {
        match &request.operation {
            Operation::Create | Operation::Delete if request.dry_run => {
                info!("Dry run, skipping Infoblox");
                Ok(Verdict::Allowed)
            }
            Operation::Create => self.on_create(request.object.as_ref()).await,
            Operation::Delete => self.on_delete(request.old_object.as_ref()).await,
            other => Err(WebhookError::UnsupportedOperation(format!("{:?}", other))),
        }
    }

    async fn on_create(&self, object: Option<&DynamicObject>) -> Result<Verdict, WebhookError> {
        let mut machine = decode(object)?;
        if !self.requires_allocation(&machine) {
            debug!("No IPAM markers, admitting unchanged");
            return Ok(Verdict::Allowed);
        }

        let original = serde_json::to_value(&machine)?;
        let allocated = self.allocation.allocate(&mut machine).await?;
        let mutated = serde_json::to_value(&machine)?;

        info!("Allocated {} addresses", allocated);
        Ok(Verdict::Patched(json_patch::diff(&original, &mutated)))
    }

    async fn on_delete(&self, old_object: Option<&DynamicObject>) -> Result<Verdict, WebhookError> {
        let mut machine = decode(old_object)?;
        if !self.requires_cleanup(&machine) {
            debug!("No recorded allocations, admitting");
            return Ok(Verdict::Allowed);
        }

        let released = self.cleanup.release(&mut machine).await?;
        info!("Released {} records", released);
        Ok(Verdict::Allowed)
    }

    /// Whether any interface address carries the marker prefix
    pub fn requires_allocation(&self, machine: &VSphereMachine) -> bool {
        machine.ip_addrs().any(|address| self.parser.is_marker(address))
    }

    /// Whether the machine records allocations to release
    pub fn requires_cleanup(&self, machine: &VSphereMachine) -> bool {
        machine.annotation(&self.annotation).is_some()
    }
}

/// Typed view of the admission object
pub fn decode(object: Option<&DynamicObject>) -> Result<VSphereMachine, WebhookError> {
    let object =
        object.ok_or_else(|| WebhookError::Decode("request carries no object".to_string()))?;
    let value = serde_json::to_value(object).map_err(|e| WebhookError::Decode(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| WebhookError::Decode(e.to_string()))
}

fn deny(request: &AdmissionRequest<DynamicObject>, error: &WebhookError) -> AdmissionResponse {
    let code = error.status_code();
    warn!("Denying request ({}): {}", code, error);
    let mut response = AdmissionResponse::from(request).deny(error.to_string());
    response.result.code = code;
    response
}
