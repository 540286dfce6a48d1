//! Mock InfobloxClient for unit testing
//!
//! Records every call it receives and hands out sequential references
//! (`ref1`, `ref2`, ...) so tests can assert on exact call order without a
//! running grid master. Failures can be injected per call.

use crate::error::InfobloxError;
use crate::models::{RecordA, RecordRequest};
use crate::infoblox_trait::InfobloxClientTrait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Mock InfobloxClient for testing
#[derive(Clone)]
pub struct MockInfobloxClient {
    base_url: String,
    // Address returned for every allocation
    address: Arc<Mutex<String>>,
    // Calls received, in order (including failed ones)
    allocations: Arc<Mutex<Vec<RecordRequest>>>,
    releases: Arc<Mutex<Vec<String>>>,
    // Failure injection
    fail_allocation_at: Arc<Mutex<Option<usize>>>,
    fail_release_of: Arc<Mutex<HashSet<String>>>,
    // Counter for generating references
    next_ref: Arc<Mutex<u64>>,
}

impl MockInfobloxClient {
    /// Create a new mock client that allocates `0.0.0.0`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            address: Arc::new(Mutex::new("0.0.0.0".to_string())),
            allocations: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(Mutex::new(Vec::new())),
            fail_allocation_at: Arc::new(Mutex::new(None)),
            fail_release_of: Arc::new(Mutex::new(HashSet::new())),
            next_ref: Arc::new(Mutex::new(1)),
        }
    }

    /// Set the address returned by subsequent allocations (for test setup)
    pub fn set_address(&self, address: impl Into<String>) {
        *self.address.lock().unwrap() = address.into();
    }

    /// Make the allocation call with the given zero-based index fail
    pub fn fail_allocation_at(&self, call: usize) {
        *self.fail_allocation_at.lock().unwrap() = Some(call);
    }

    /// Make every release of `reference` fail
    pub fn fail_release_of(&self, reference: impl Into<String>) {
        self.fail_release_of.lock().unwrap().insert(reference.into());
    }

    /// Allocation requests received so far
    pub fn allocations(&self) -> Vec<RecordRequest> {
        self.allocations.lock().unwrap().clone()
    }

    /// Record names of allocation requests received so far
    pub fn allocated_names(&self) -> Vec<String> {
        self.allocations().into_iter().map(|r| r.name).collect()
    }

    /// References passed to release so far
    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().unwrap().clone()
    }

    fn next_reference(&self) -> String {
        let mut id = self.next_ref.lock().unwrap();
        let reference = format!("ref{}", *id);
        *id += 1;
        reference
    }
}

#[async_trait::async_trait]
impl InfobloxClientTrait for MockInfobloxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn allocate_record(&self, request: &RecordRequest) -> Result<RecordA, InfobloxError> {
        let call = {
            let mut allocations = self.allocations.lock().unwrap();
            allocations.push(request.clone());
            allocations.len() - 1
        };

        if *self.fail_allocation_at.lock().unwrap() == Some(call) {
            return Err(InfobloxError::Api(format!(
                "No available IP in network {}",
                request.cidr
            )));
        }

        Ok(RecordA {
            reference: self.next_reference(),
            ipv4addr: self.address.lock().unwrap().clone(),
            name: request.name.clone(),
            view: request.dns_view.clone(),
        })
    }

    async fn release_record(&self, reference: &str) -> Result<(), InfobloxError> {
        self.releases.lock().unwrap().push(reference.to_string());

        if self.fail_release_of.lock().unwrap().contains(reference) {
            return Err(InfobloxError::Api(format!(
                "Failed to delete {}",
                reference
            )));
        }
        Ok(())
    }
}
