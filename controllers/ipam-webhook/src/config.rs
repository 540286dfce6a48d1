//! Webhook configuration
//!
//! Process settings come from environment variables. Infoblox connection
//! details are read once at startup from a ConfigMap (host, port, WAPI
//! version, TLS verification, tenant attributes) and a Secret (credentials).
//! The serving certificate is read from `tls.crt` and `tls.key` in the
//! certificate directory, the layout cert-manager and controller-runtime use.

use crate::error::WebhookError;
use crate::marker::DELIMITER;
use infoblox_client::{HostConfig, TransportConfig};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "webhook-config";
pub const DEFAULT_SECRET_NAME: &str = "webhook-credentials";
pub const DEFAULT_NAMESPACE: &str = "infoblox";
pub const DEFAULT_ANNOTATION: &str = "infoblox.ipam.capv";
pub const DEFAULT_PREFIX: &str = "infoblox";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:7443";
pub const DEFAULT_CERT_DIR: &str = "/tmp/k8s-webhook-server/serving-certs";
pub const CERT_FILE: &str = "tls.crt";
pub const KEY_FILE: &str = "tls.key";
pub const DEFAULT_PORT: &str = "443";
pub const DEFAULT_WAPI_VERSION: &str = "2.10";

/// Settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub config_name: String,
    pub config_namespace: String,
    pub secret_name: String,
    pub secret_namespace: String,
    /// Annotation key holding allocated record references
    pub annotation: String,
    /// First marker segment identifying an IPAM marker
    pub prefix: String,
    pub bind_address: SocketAddr,
    /// Directory holding the serving certificate and key
    pub cert_dir: PathBuf,
}

impl WebhookConfig {
    pub fn from_env() -> Result<Self, WebhookError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, applying defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WebhookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind = get("WEBHOOK_BIND_ADDRESS", DEFAULT_BIND_ADDRESS);
        let bind_address = bind.parse().map_err(|e| {
            WebhookError::InvalidConfig(format!("WEBHOOK_BIND_ADDRESS {:?}: {}", bind, e))
        })?;

        let config = Self {
            config_name: get("INFOBLOX_CONFIG_NAME", DEFAULT_CONFIG_NAME),
            config_namespace: get("INFOBLOX_CONFIG_NAMESPACE", DEFAULT_NAMESPACE),
            secret_name: get("INFOBLOX_SECRET_NAME", DEFAULT_SECRET_NAME),
            secret_namespace: get("INFOBLOX_SECRET_NAMESPACE", DEFAULT_NAMESPACE),
            annotation: get("INFOBLOX_ANNOTATION", DEFAULT_ANNOTATION),
            prefix: get("INFOBLOX_PREFIX", DEFAULT_PREFIX),
            bind_address,
            cert_dir: PathBuf::from(get("WEBHOOK_CERT_DIR", DEFAULT_CERT_DIR)),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), WebhookError> {
        if self.prefix.is_empty() {
            return Err(WebhookError::InvalidConfig(
                "INFOBLOX_PREFIX must not be empty".to_string(),
            ));
        }
        if self.prefix.contains(DELIMITER) {
            return Err(WebhookError::InvalidConfig(format!(
                "INFOBLOX_PREFIX {:?} must not contain {:?}",
                self.prefix, DELIMITER
            )));
        }
        if self.annotation.is_empty() {
            return Err(WebhookError::InvalidConfig(
                "INFOBLOX_ANNOTATION must not be empty".to_string(),
            ));
        }
        if self.cert_dir.as_os_str().is_empty() {
            return Err(WebhookError::InvalidConfig(
                "WEBHOOK_CERT_DIR must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cert_path(&self) -> PathBuf {
        self.cert_dir.join(CERT_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.cert_dir.join(KEY_FILE)
    }
}

/// Everything needed to build an `InfobloxClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfobloxConnection {
    pub host: HostConfig,
    pub transport: TransportConfig,
    pub cmp_type: Option<String>,
    pub tenant_id: Option<String>,
}

/// Read the connection ConfigMap and credentials Secret named in `config`
pub async fn load_connection(
    client: Client,
    config: &WebhookConfig,
) -> Result<InfobloxConnection, WebhookError> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &config.config_namespace);
    let secrets: Api<Secret> = Api::namespaced(client, &config.secret_namespace);

    let config_map = config_maps.get(&config.config_name).await?;
    let secret = secrets.get(&config.secret_name).await?;

    info!(
        "Loaded Infoblox connection from ConfigMap {}/{} and Secret {}/{}",
        config.config_namespace, config.config_name, config.secret_namespace, config.secret_name
    );
    connection_from(&config_map, &secret)
}

pub fn connection_from(
    config_map: &ConfigMap,
    secret: &Secret,
) -> Result<InfobloxConnection, WebhookError> {
    let data = config_map.data.clone().unwrap_or_default();
    let optional = |key: &str| data.get(key).filter(|v| !v.is_empty()).cloned();

    let host = optional("host")
        .ok_or_else(|| WebhookError::InvalidConfig("ConfigMap key host is required".to_string()))?;
    let port = optional("port").unwrap_or_else(|| DEFAULT_PORT.to_string());
    let version = optional("version").unwrap_or_else(|| DEFAULT_WAPI_VERSION.to_string());
    let ssl_verify = match optional("sslVerify") {
        None => true,
        Some(value) => value.parse::<bool>().map_err(|_| {
            WebhookError::InvalidConfig(format!(
                "ConfigMap key sslVerify must be true or false, got {:?}",
                value
            ))
        })?,
    };

    Ok(InfobloxConnection {
        host: HostConfig {
            host,
            port,
            version,
            username: secret_value(secret, "username")?,
            password: secret_value(secret, "password")?,
        },
        transport: TransportConfig {
            ssl_verify,
            ..TransportConfig::default()
        },
        cmp_type: optional("cmpType"),
        tenant_id: optional("tenantID"),
    })
}

fn secret_value(secret: &Secret, key: &str) -> Result<String, WebhookError> {
    if let Some(bytes) = secret.data.as_ref().and_then(|data| data.get(key)) {
        return String::from_utf8(bytes.0.clone()).map_err(|_| {
            WebhookError::InvalidConfig(format!("Secret key {} is not valid UTF-8", key))
        });
    }
    secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
        .cloned()
        .ok_or_else(|| WebhookError::InvalidConfig(format!("Secret key {} is required", key)))
}
