//! Allocation engine
//!
//! Resolves IPAM markers on a newly created machine. Every marker is parsed
//! before the first Infoblox call, so a malformed marker never leaves a
//! half-allocated machine behind. Allocations then run sequentially and stop
//! at the first failure; references obtained up to that point are recorded
//! in the annotation and are not rolled back.

use crate::annotation::{REFERENCE_DELIMITER, join_references};
use crate::error::WebhookError;
use crate::marker::MarkerParser;
use capv_types::VSphereMachine;
use infoblox_client::{InfobloxClientTrait, RecordRequest};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One marker to resolve, located by device and address index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAllocation {
    pub device: usize,
    pub index: usize,
    pub request: RecordRequest,
}

/// Replaces markers with addresses reserved in Infoblox
pub struct AllocationEngine {
    client: Arc<dyn InfobloxClientTrait>,
    parser: MarkerParser,
    annotation: String,
}

impl AllocationEngine {
    pub fn new(
        client: Arc<dyn InfobloxClientTrait>,
        parser: MarkerParser,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            client,
            parser,
            annotation: annotation.into(),
        }
    }

    /// Parse every marker on the machine without touching Infoblox.
    pub fn plan(&self, machine: &VSphereMachine) -> Result<Vec<PlannedAllocation>, WebhookError> {
        let machine_name = machine.name_any();
        let mut plan = Vec::new();

        for (device, spec) in machine.devices().iter().enumerate() {
            for (index, address) in spec.ip_addrs.iter().enumerate() {
                let Some(marker) = self.parser.parse(address)? else {
                    continue;
                };
                debug!(
                    "Planning allocation for device {} address {} ({})",
                    device,
                    index,
                    marker.format(self.parser.prefix())
                );
                let name = marker
                    .name
                    .unwrap_or_else(|| record_name(&machine_name, device, index));
                plan.push(PlannedAllocation {
                    device,
                    index,
                    request: RecordRequest {
                        network_view: marker.network_view,
                        dns_view: marker.dns_view,
                        name,
                        cidr: marker.cidr,
                    },
                });
            }
        }

        Ok(plan)
    }

    /// Resolve all markers on `machine` in place.
    ///
    /// Returns the number of addresses allocated. On failure the machine
    /// still carries every address and reference obtained before the
    /// failing call.
    pub async fn allocate(&self, machine: &mut VSphereMachine) -> Result<usize, WebhookError> {
        let plan = self.plan(machine)?;
        if plan.is_empty() {
            return Ok(0);
        }

        let mut updates = Vec::with_capacity(plan.len());
        let mut references = Vec::with_capacity(plan.len());
        let mut failure = None;

        for planned in &plan {
            let request = &planned.request;
            debug!(
                "Allocating {} in {} (network view {}, DNS view {})",
                request.name, request.cidr, request.network_view, request.dns_view
            );

            let record = match self.client.allocate_record(request).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Failed to allocate {} in {}: {}", request.name, request.cidr, e);
                    failure = Some(WebhookError::from(e));
                    break;
                }
            };

            if record.reference.contains(REFERENCE_DELIMITER) {
                warn!(
                    "Infoblox reference {} for {} cannot be stored and must be released manually",
                    record.reference, request.name
                );
                failure = Some(WebhookError::InvalidReference(record.reference));
                break;
            }

            let address = resolved_address(&record.ipv4addr, &request.cidr);
            info!("Allocated {} for {} ({})", address, request.name, record.reference);
            updates.push((planned.device, planned.index, address));
            references.push(record.reference);
        }

        let allocated = updates.len();
        for (device, index, address) in updates {
            machine.spec.network.devices[device].ip_addrs[index] = address;
        }
        self.record_references(machine, &references);

        match failure {
            Some(e) => Err(e),
            None => Ok(allocated),
        }
    }

    // Any value present on CREATE was not written for this machine.
    fn record_references(&self, machine: &mut VSphereMachine, references: &[String]) {
        if let Some(stale) = machine.annotation(&self.annotation) {
            warn!("Replacing foreign {} annotation {:?}", self.annotation, stale);
        }
        machine
            .annotations_mut()
            .insert(self.annotation.clone(), join_references(references));
    }
}

/// Generated record name for an unnamed marker
pub fn record_name(machine: &str, device: usize, index: usize) -> String {
    format!("{}-{}-{}", machine, device, index)
}

/// Address as written back into the machine: the reserved address carrying
/// the prefix length of the network it was taken from.
pub fn resolved_address(address: &str, cidr: &str) -> String {
    match cidr.split_once('/') {
        Some((_, prefix_len)) if !prefix_len.is_empty() => format!("{}/{}", address, prefix_len),
        _ => address.to_string(),
    }
}
