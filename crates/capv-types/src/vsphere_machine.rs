//! VSphereMachine
//!
//! Typed view of the Cluster API vSphere provider's machine resource.
//! Only the network devices are modelled; every other field is carried in
//! flattened maps so that decoding and re-encoding an object never loses data.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// API group of the Cluster API vSphere provider
pub const CAPV_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// API version of `VSphereMachine` handled by the webhook
pub const CAPV_VERSION: &str = "v1alpha3";

/// Plural resource name of `VSphereMachine`
pub const VSPHERE_MACHINE_RESOURCE: &str = "vspheremachines";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "VSphereMachine",
    namespaced,
    status = "VSphereMachineStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct VSphereMachineSpec {
    /// Network configuration of the cloned virtual machine
    #[serde(default)]
    pub network: NetworkSpec,

    /// Remaining clone spec fields (template, datacenter, numCPUs, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Network devices, in the order they are attached
    #[serde(default)]
    pub devices: Vec<NetworkDeviceSpec>,

    /// Remaining network fields (routes, preferredAPIServerCidr, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeviceSpec {
    /// Name of the vSphere network the device is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,

    /// Static addresses in CIDR notation, or IPAM markers to be resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addrs: Vec<String>,

    /// Remaining device fields (dhcp4, gateway4, nameservers, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Status is owned by the vSphere provider and passed through untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct VSphereMachineStatus {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl NetworkDeviceSpec {
    /// Device with the given addresses and no other settings
    pub fn with_ip_addrs<I, S>(ip_addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ip_addrs: ip_addrs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl VSphereMachine {
    /// Network devices declared on the machine
    pub fn devices(&self) -> &[NetworkDeviceSpec] {
        &self.spec.network.devices
    }

    /// Every interface address of every device, in declaration order
    pub fn ip_addrs(&self) -> impl Iterator<Item = &str> {
        self.devices()
            .iter()
            .flat_map(|device| device.ip_addrs.iter().map(String::as_str))
    }

    /// Value of an annotation, if present
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }
}
