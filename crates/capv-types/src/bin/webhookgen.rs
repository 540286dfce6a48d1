//! Prints the MutatingWebhookConfiguration for the IPAM webhook as YAML.
//!
//! Usage: `webhookgen [service-name] [service-namespace] [port] [ca-bundle.pem]`

use anyhow::Context;
use capv_types::{WebhookService, mutating_webhook_configuration};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);

    let name = args.next().unwrap_or_else(|| "infoblox-ipam-webhook".to_string());
    let namespace = args.next().unwrap_or_else(|| "infoblox".to_string());
    let port = match args.next() {
        Some(port) => port.parse().with_context(|| format!("invalid port: {}", port))?,
        None => 443,
    };
    let ca_bundle = match args.next() {
        Some(path) => Some(
            std::fs::read(&path).with_context(|| format!("failed to read CA bundle {}", path))?,
        ),
        None => None,
    };

    let service = WebhookService {
        name,
        namespace,
        port,
        ca_bundle,
    };
    let config = mutating_webhook_configuration("infoblox-ipam", &service);
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
