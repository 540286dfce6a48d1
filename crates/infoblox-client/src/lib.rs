//! Infoblox WAPI Client
//!
//! A Rust client library for the parts of the Infoblox Web API (WAPI) the
//! IPAM admission webhook needs: reserving the next available address in a
//! network as a DNS A record, and deleting that record again by reference.
//!
//! # Example
//!
//! ```no_run
//! use infoblox_client::{HostConfig, InfobloxClient, RecordRequest, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = HostConfig {
//!     host: "infoblox.example.com".to_string(),
//!     port: "443".to_string(),
//!     version: "2.10".to_string(),
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//! };
//! let client = InfobloxClient::new(host, TransportConfig::default())?;
//!
//! // Reserve the next free address in 10.0.0.0/24 with an A record
//! let record = client
//!     .create_a_record(&RecordRequest {
//!         network_view: "default".to_string(),
//!         dns_view: "default".to_string(),
//!         name: "vm1-0-0.example.com".to_string(),
//!         cidr: "10.0.0.0/24".to_string(),
//!     })
//!     .await?;
//!
//! // Release it again
//! client.delete_record(&record.reference).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod infoblox_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::InfobloxClient;
pub use common::HttpClient;
pub use error::InfobloxError;
pub use models::*;
pub use infoblox_trait::InfobloxClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockInfobloxClient;
