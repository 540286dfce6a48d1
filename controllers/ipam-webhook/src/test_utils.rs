//! Shared fixtures for webhook unit tests

use capv_types::VSphereMachine;
use infoblox_client::MockInfobloxClient;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionReview};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const TEST_PREFIX: &str = "infoblox";
pub const TEST_ANNOTATION: &str = "infoblox.ipam.capv";

/// Machine JSON with one device per entry of `devices`
pub fn machine_json(name: &str, devices: &[&[&str]]) -> Value {
    let devices: Vec<Value> = devices
        .iter()
        .map(|addrs| {
            json!({
                "networkName": "VM Network",
                "dhcp4": false,
                "gateway4": "10.0.0.1",
                "ipAddrs": addrs,
            })
        })
        .collect();

    json!({
        "apiVersion": "infrastructure.cluster.x-k8s.io/v1alpha3",
        "kind": "VSphereMachine",
        "metadata": {
            "name": name,
            "namespace": "default",
            "labels": {"cluster.x-k8s.io/cluster-name": "workload"}
        },
        "spec": {
            "datacenter": "dc1",
            "template": "ubuntu-2004",
            "numCPUs": 2,
            "network": {
                "devices": devices,
                "preferredAPIServerCidr": "10.0.0.0/24"
            }
        }
    })
}

/// Same as `machine_json` with annotations set
pub fn annotated_machine_json(
    name: &str,
    devices: &[&[&str]],
    annotations: BTreeMap<&str, &str>,
) -> Value {
    let mut machine = machine_json(name, devices);
    machine["metadata"]["annotations"] = json!(annotations);
    machine
}

pub fn machine(name: &str, devices: &[&[&str]]) -> VSphereMachine {
    serde_json::from_value(machine_json(name, devices)).unwrap()
}

pub fn mock_client() -> MockInfobloxClient {
    MockInfobloxClient::new("http://test-infoblox")
}

/// Full AdmissionReview body as the API server would send it
pub fn admission_review_json(
    operation: &str,
    object: Option<Value>,
    old_object: Option<Value>,
    dry_run: bool,
) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": {"group": "infrastructure.cluster.x-k8s.io", "version": "v1alpha3", "kind": "VSphereMachine"},
            "resource": {"group": "infrastructure.cluster.x-k8s.io", "version": "v1alpha3", "resource": "vspheremachines"},
            "name": "vm1",
            "namespace": "default",
            "operation": operation,
            "userInfo": {"username": "system:serviceaccount:capi-system:capi-controller-manager"},
            "object": object,
            "oldObject": old_object,
            "dryRun": dry_run,
        }
    })
}

pub fn admission_request(
    operation: &str,
    object: Option<Value>,
    old_object: Option<Value>,
    dry_run: bool,
) -> AdmissionRequest<DynamicObject> {
    let review: AdmissionReview<DynamicObject> =
        serde_json::from_value(admission_review_json(operation, object, old_object, dry_run))
            .unwrap();
    review.try_into().unwrap()
}
