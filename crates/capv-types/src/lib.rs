//! CAPV Types
//!
//! Cluster API vSphere resource types used by the IPAM webhook, and the
//! webhook's own registration manifest.

pub mod vsphere_machine;
pub mod webhook;

pub use vsphere_machine::*;
pub use webhook::*;
