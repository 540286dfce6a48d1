//! Integration tests for the Infoblox client
//!
//! These tests require a reachable grid master.
//! Set INFOBLOX_HOST, INFOBLOX_USERNAME, INFOBLOX_PASSWORD and INFOBLOX_CIDR to run.

use infoblox_client::{HostConfig, InfobloxClient, RecordRequest, TransportConfig};

fn client_from_env() -> InfobloxClient {
    let host = HostConfig {
        host: std::env::var("INFOBLOX_HOST").expect("INFOBLOX_HOST environment variable must be set"),
        port: std::env::var("INFOBLOX_PORT").unwrap_or_else(|_| "443".to_string()),
        version: std::env::var("INFOBLOX_VERSION").unwrap_or_else(|_| "2.10".to_string()),
        username: std::env::var("INFOBLOX_USERNAME")
            .expect("INFOBLOX_USERNAME environment variable must be set"),
        password: std::env::var("INFOBLOX_PASSWORD")
            .expect("INFOBLOX_PASSWORD environment variable must be set"),
    };
    let transport = TransportConfig {
        ssl_verify: std::env::var("INFOBLOX_SSL_VERIFY").map(|v| v != "false").unwrap_or(true),
        ..TransportConfig::default()
    };

    InfobloxClient::new(host, transport).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running Infoblox grid master
async fn test_validate_connection() {
    let client = client_from_env();
    client.validate_connection().await.expect("Failed to validate connection");
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_a_record() {
    let client = client_from_env();
    let cidr = std::env::var("INFOBLOX_CIDR").expect("INFOBLOX_CIDR environment variable must be set");
    let zone = std::env::var("INFOBLOX_ZONE").unwrap_or_else(|_| "example.com".to_string());

    let record = client
        .create_a_record(&RecordRequest {
            network_view: std::env::var("INFOBLOX_NETWORK_VIEW").unwrap_or_else(|_| "default".to_string()),
            dns_view: std::env::var("INFOBLOX_DNS_VIEW").unwrap_or_else(|_| "default".to_string()),
            name: format!("ipam-webhook-it.{}", zone),
            cidr,
        })
        .await
        .expect("Failed to create A record");

    println!("Allocated {} as {}", record.ipv4addr, record.reference);
    assert!(!record.reference.contains(','), "references must not contain commas");

    client.delete_record(&record.reference).await.expect("Failed to delete A record");

    // Second delete of the same reference is a no-op
    client.delete_record(&record.reference).await.expect("Repeated delete should succeed");
}
