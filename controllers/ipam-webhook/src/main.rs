//! Infoblox IPAM Webhook
//!
//! Mutating admission webhook for Cluster API vSphere machines.
//!
//! On CREATE it replaces `infoblox:<network-view>:<dns-view>:<cidr>[:<name>]`
//! markers in `spec.network.devices[].ipAddrs` with addresses reserved in
//! Infoblox, recording the record references in an annotation. On DELETE it
//! releases those records again.

mod allocation;
mod annotation;
mod cleanup;
mod config;
mod error;
mod gatekeeper;
mod marker;
mod server;

#[cfg(test)]
mod test_utils;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::gatekeeper::Gatekeeper;
use infoblox_client::{InfobloxClient, InfobloxClientTrait};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), WebhookError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube and reqwest both use rustls; pick one provider for the process
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting Infoblox IPAM webhook");

    let config = WebhookConfig::from_env()?;
    info!("Configuration:");
    info!("  Marker prefix: {}", config.prefix);
    info!("  Annotation: {}", config.annotation);
    info!("  ConfigMap: {}/{}", config.config_namespace, config.config_name);
    info!("  Secret: {}/{}", config.secret_namespace, config.secret_name);
    info!("  Bind address: {}", config.bind_address);
    info!("  Certificate directory: {}", config.cert_dir.display());

    let kube_client = kube::Client::try_default().await?;
    let connection = config::load_connection(kube_client, &config).await?;

    let client = InfobloxClient::new(connection.host, connection.transport)?
        .with_tenant(connection.cmp_type, connection.tenant_id);
    client.validate_connection().await?;
    info!("Connected to Infoblox at {}", client.base_url());

    let client: Arc<dyn InfobloxClientTrait> = Arc::new(client);
    let gatekeeper = Arc::new(Gatekeeper::new(client, &config));

    let tls = server::load_tls(&config).await?;
    server::serve(config.bind_address, server::router(gatekeeper), tls).await
}
