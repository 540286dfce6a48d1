//! IPAM marker parsing.
//!
//! An interface address of the form
//! `<prefix>:<network-view>:<dns-view>:<cidr>[:<record-name>]` asks the
//! webhook to reserve an address instead of carrying one. Anything whose
//! first `:`-separated segment is not the prefix is an ordinary address.

use thiserror::Error;

/// Separator between marker fields
pub const DELIMITER: char = ':';

/// Errors for addresses that carry the prefix but are not valid markers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error(
        "{marker:?} has {found} fields after the prefix, expected network-view:dns-view:cidr with an optional record name"
    )]
    FieldCount { marker: String, found: usize },

    #[error("{marker:?} has an empty {field}")]
    EmptyField { marker: String, field: &'static str },
}

/// A parsed IPAM marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub network_view: String,
    pub dns_view: String,
    pub cidr: String,
    /// Record name to use instead of the generated one
    pub name: Option<String>,
}

impl Marker {
    /// Render the marker back into its interface address form
    pub fn format(&self, prefix: &str) -> String {
        let mut fields = vec![prefix, &self.network_view, &self.dns_view, &self.cidr];
        if let Some(name) = &self.name {
            fields.push(name);
        }
        fields.join(&DELIMITER.to_string())
    }
}

/// Recognizes and parses markers for one configured prefix
#[derive(Debug, Clone)]
pub struct MarkerParser {
    prefix: String,
}

impl MarkerParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether the address carries the prefix, well-formed or not
    pub fn is_marker(&self, address: &str) -> bool {
        address.split(DELIMITER).next() == Some(self.prefix.as_str())
    }

    /// Parse an interface address.
    ///
    /// Returns `Ok(None)` for ordinary addresses and an error for addresses
    /// that carry the prefix but are malformed.
    pub fn parse(&self, address: &str) -> Result<Option<Marker>, MarkerError> {
        if !self.is_marker(address) {
            return Ok(None);
        }

        let fields: Vec<&str> = address.split(DELIMITER).skip(1).collect();
        let (network_view, dns_view, cidr, name) = match fields.as_slice() {
            [network_view, dns_view, cidr] => (*network_view, *dns_view, *cidr, None),
            [network_view, dns_view, cidr, name] => (*network_view, *dns_view, *cidr, Some(*name)),
            _ => {
                return Err(MarkerError::FieldCount {
                    marker: address.to_string(),
                    found: fields.len(),
                });
            }
        };

        for (field, value) in [
            ("network view", Some(network_view)),
            ("DNS view", Some(dns_view)),
            ("cidr", Some(cidr)),
            ("record name", name),
        ] {
            if value == Some("") {
                return Err(MarkerError::EmptyField {
                    marker: address.to_string(),
                    field,
                });
            }
        }

        Ok(Some(Marker {
            network_view: network_view.to_string(),
            dns_view: dns_view.to_string(),
            cidr: cidr.to_string(),
            name: name.map(str::to_string),
        }))
    }
}
