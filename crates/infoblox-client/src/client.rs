//! Infoblox WAPI client
//!
//! Implements address reservation against a grid master using A records
//! whose address is assigned by `func:nextavailableip`.

use crate::common::HttpClient;
use crate::error::InfobloxError;
use crate::models::*;
use crate::infoblox_trait::InfobloxClientTrait;
use reqwest::Client;
use tracing::{debug, info};

/// Fields requested back when creating an A record
const RECORD_A_RETURN_FIELDS: &str = "ipv4addr,name,view";

/// Extensible attribute carrying the cloud platform type
pub const EA_CMP_TYPE: &str = "CMP Type";

/// Extensible attribute carrying the tenant identifier
pub const EA_TENANT_ID: &str = "Tenant ID";

/// Infoblox WAPI client
pub struct InfobloxClient {
    http: HttpClient,
    extattrs: ExtensibleAttributes,
}

impl InfobloxClient {
    /// Create a new Infoblox client
    ///
    /// # Arguments
    /// * `host` - Grid master address, WAPI version and credentials
    /// * `transport` - TLS verification and request timeout
    pub fn new(host: HostConfig, transport: TransportConfig) -> Result<Self, InfobloxError> {
        let client = Client::builder()
            .timeout(transport.request_timeout)
            .danger_accept_invalid_certs(!transport.ssl_verify)
            .build()
            .map_err(InfobloxError::Http)?;

        let base_url = host.base_url();
        Ok(Self {
            http: HttpClient::new(client, base_url, host.username, host.password),
            extattrs: ExtensibleAttributes::new(),
        })
    }

    /// Tag every created object with the platform type and tenant
    ///
    /// Empty values are skipped.
    #[must_use]
    pub fn with_tenant(mut self, cmp_type: Option<String>, tenant_id: Option<String>) -> Self {
        for (key, value) in [(EA_CMP_TYPE, cmp_type), (EA_TENANT_ID, tenant_id)] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                self.extattrs.insert(key.to_string(), EaValue { value });
            }
        }
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Extensible attributes attached to created records
    pub fn extattrs(&self) -> &ExtensibleAttributes {
        &self.extattrs
    }

    /// Check connectivity and credentials with a lightweight authenticated read.
    ///
    /// # Returns
    /// * `Ok(())` - Credentials are valid and the grid master is reachable
    /// * `Err(InfobloxError)` - Credentials are invalid or the grid master is unreachable
    pub async fn validate_connection(&self) -> Result<(), InfobloxError> {
        debug!("Validating Infoblox credentials and connectivity");
        let _grid: Vec<serde_json::Value> = self.http.get("grid", &[]).await?;
        debug!("Infoblox connection validated");
        Ok(())
    }

    /// Create an A record on the next available address of a network
    ///
    /// # Arguments
    /// * `request` - Network view, DNS view, record name and network
    ///
    /// # Returns
    /// * `Ok(RecordA)` - The created record, including its `_ref`
    /// * `Err(InfobloxError)` - If the network is exhausted or the call fails
    pub async fn create_a_record(&self, request: &RecordRequest) -> Result<RecordA, InfobloxError> {
        let body = a_record_body(request, &self.extattrs)?;
        let record: RecordA = self
            .http
            .post("record:a", &[("_return_fields", RECORD_A_RETURN_FIELDS)], &body)
            .await?;

        info!(
            "Created A record {} -> {} in view {}",
            record.name, record.ipv4addr, record.view
        );
        Ok(record)
    }

    /// Delete a record by its reference
    ///
    /// A reference that no longer exists is treated as already deleted.
    pub async fn delete_record(&self, reference: &str) -> Result<(), InfobloxError> {
        if reference.is_empty() {
            return Err(InfobloxError::InvalidRequest(
                "record reference must not be empty".to_string(),
            ));
        }

        match self.http.delete(reference).await {
            Ok(()) => {
                info!("Deleted Infoblox record {}", reference);
                Ok(())
            }
            Err(InfobloxError::NotFound(detail)) => {
                debug!("Record {} already gone: {}", reference, detail);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Build the WAPI body for an A record on the next available address
pub fn a_record_body(
    request: &RecordRequest,
    extattrs: &ExtensibleAttributes,
) -> Result<serde_json::Value, InfobloxError> {
    for (field, value) in [
        ("network view", &request.network_view),
        ("DNS view", &request.dns_view),
        ("name", &request.name),
        ("cidr", &request.cidr),
    ] {
        if value.is_empty() {
            return Err(InfobloxError::InvalidRequest(format!(
                "A record {} must not be empty",
                field
            )));
        }
    }

    let mut body = serde_json::json!({
        "name": request.name,
        "view": request.dns_view,
        "ipv4addr": format!("func:nextavailableip:{},{}", request.cidr, request.network_view),
    });
    if !extattrs.is_empty() {
        body["extattrs"] = serde_json::to_value(extattrs)?;
    }
    Ok(body)
}

#[async_trait::async_trait]
impl InfobloxClientTrait for InfobloxClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn allocate_record(&self, request: &RecordRequest) -> Result<RecordA, InfobloxError> {
        self.create_a_record(request).await
    }

    async fn release_record(&self, reference: &str) -> Result<(), InfobloxError> {
        self.delete_record(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostConfig {
        HostConfig {
            host: "gm.example.com".to_string(),
            port: "8443".to_string(),
            version: "2.10".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    fn request() -> RecordRequest {
        RecordRequest {
            network_view: "netviewA".to_string(),
            dns_view: "dnsviewA".to_string(),
            name: "vm1-0-0".to_string(),
            cidr: "10.0.0.0/24".to_string(),
        }
    }

    #[test]
    fn test_client_base_url() {
        let client = InfobloxClient::new(host(), TransportConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://gm.example.com:8443/wapi/v2.10/");
    }

    #[test]
    fn test_host_config_debug_redacts_password() {
        let rendered = format!("{:?}", host());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_a_record_body_uses_next_available_ip() {
        let body = a_record_body(&request(), &ExtensibleAttributes::new()).unwrap();
        assert_eq!(body["name"], "vm1-0-0");
        assert_eq!(body["view"], "dnsviewA");
        assert_eq!(body["ipv4addr"], "func:nextavailableip:10.0.0.0/24,netviewA");
        assert!(body.get("extattrs").is_none());
    }

    #[test]
    fn test_a_record_body_carries_tenant_attributes() {
        let client = InfobloxClient::new(host(), TransportConfig::default())
            .unwrap()
            .with_tenant(Some("CAPV".to_string()), Some(String::new()));
        assert_eq!(client.extattrs().len(), 1);

        let body = a_record_body(&request(), client.extattrs()).unwrap();
        assert_eq!(body["extattrs"]["CMP Type"]["value"], "CAPV");
        assert!(body["extattrs"].get("Tenant ID").is_none());
    }

    #[test]
    fn test_a_record_body_rejects_empty_fields() {
        let mut req = request();
        req.cidr = String::new();
        let err = a_record_body(&req, &ExtensibleAttributes::new()).unwrap_err();
        assert!(matches!(err, InfobloxError::InvalidRequest(_)));
    }

    #[test]
    fn test_record_a_deserializes_wapi_response() {
        let record: RecordA = serde_json::from_str(
            r#"{"_ref": "record:a/ZG5zLmJpbmRfYSQuX2RlZmF1bHQ:vm1-0-0/default", "ipv4addr": "10.0.0.5", "name": "vm1-0-0", "view": "default"}"#,
        )
        .unwrap();
        assert_eq!(record.reference, "record:a/ZG5zLmJpbmRfYSQuX2RlZmF1bHQ:vm1-0-0/default");
        assert_eq!(record.ipv4addr, "10.0.0.5");
    }

    #[tokio::test]
    async fn test_delete_record_rejects_empty_reference() {
        let client = InfobloxClient::new(host(), TransportConfig::default()).unwrap();
        let err = client.delete_record("").await.unwrap_err();
        assert!(matches!(err, InfobloxError::InvalidRequest(_)));
    }
}
