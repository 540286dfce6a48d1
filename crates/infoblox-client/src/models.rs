//! Infoblox WAPI models
//!
//! These models cover the subset of WAPI objects used for address
//! reservation. See the WAPI reference for `record:a`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Connection details for a grid master
#[derive(Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Grid master host name or address
    pub host: String,
    /// HTTPS port, usually "443"
    pub port: String,
    /// WAPI version, e.g. "2.10"
    pub version: String,
    pub username: String,
    pub password: String,
}

impl HostConfig {
    /// Base URL of the versioned WAPI endpoint, with a trailing slash
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/wapi/v{}/", self.host, self.port, self.version)
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("version", &self.version)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Verify the grid master's TLS certificate
    pub ssl_verify: bool,
    /// Timeout applied to every WAPI call
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ssl_verify: true,
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Request for a new A record on the next available address of a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    /// Network view holding `cidr`
    pub network_view: String,
    /// DNS view the A record is created in
    pub dns_view: String,
    /// Record name
    pub name: String,
    /// Network (CIDR) to take the next available address from
    pub cidr: String,
}

/// A record as returned by WAPI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordA {
    /// Opaque object reference (`_ref`), used to delete the record
    #[serde(rename = "_ref")]
    pub reference: String,
    pub ipv4addr: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub view: String,
}

/// Value of a single extensible attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EaValue {
    pub value: String,
}

/// Extensible attributes attached to created objects, keyed by attribute name
pub type ExtensibleAttributes = BTreeMap<String, EaValue>;

/// Error body returned by WAPI on failed calls
#[derive(Debug, Clone, Deserialize)]
pub struct WapiError {
    #[serde(rename = "Error", default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub text: String,
}
