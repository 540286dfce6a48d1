//! MutatingWebhookConfiguration for the IPAM webhook
//!
//! Registers the webhook for CREATE and DELETE of `VSphereMachine` objects.

use crate::vsphere_machine::{CAPV_GROUP, CAPV_VERSION, VSPHERE_MACHINE_RESOURCE};
use k8s_openapi::ByteString;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, RuleWithOperations, ServiceReference,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Path the webhook server serves admission reviews on
pub const WEBHOOK_PATH: &str = "/infoblox-ipam";

/// Fully qualified webhook name
pub const WEBHOOK_NAME: &str =
    "mutating.infoblox.ipam.vspheremachines.infrastructure.cluster.x-k8s.io";

/// Where the API server reaches the webhook
#[derive(Debug, Clone)]
pub struct WebhookService {
    pub name: String,
    pub namespace: String,
    pub port: i32,
    /// PEM bundle used to verify the webhook's serving certificate
    pub ca_bundle: Option<Vec<u8>>,
}

/// Build the registration for the IPAM webhook
///
/// Addresses are reserved in Infoblox, so the webhook declares side effects
/// that are skipped on dry-run, and fails closed.
pub fn mutating_webhook_configuration(
    config_name: &str,
    service: &WebhookService,
) -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(config_name.to_string()),
            ..Default::default()
        },
        webhooks: Some(vec![MutatingWebhook {
            name: WEBHOOK_NAME.to_string(),
            admission_review_versions: vec!["v1".to_string()],
            client_config: WebhookClientConfig {
                ca_bundle: service.ca_bundle.clone().map(ByteString),
                service: Some(ServiceReference {
                    name: service.name.clone(),
                    namespace: service.namespace.clone(),
                    path: Some(WEBHOOK_PATH.to_string()),
                    port: Some(service.port),
                }),
                url: None,
            },
            failure_policy: Some("Fail".to_string()),
            side_effects: "NoneOnDryRun".to_string(),
            timeout_seconds: Some(30),
            rules: Some(vec![RuleWithOperations {
                api_groups: Some(vec![CAPV_GROUP.to_string()]),
                api_versions: Some(vec![CAPV_VERSION.to_string()]),
                operations: Some(vec!["CREATE".to_string(), "DELETE".to_string()]),
                resources: Some(vec![VSPHERE_MACHINE_RESOURCE.to_string()]),
                scope: Some("Namespaced".to_string()),
            }]),
            ..Default::default()
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> WebhookService {
        WebhookService {
            name: "infoblox-ipam-webhook".to_string(),
            namespace: "infoblox".to_string(),
            port: 443,
            ca_bundle: None,
        }
    }

    #[test]
    fn test_webhook_targets_vsphere_machine_create_and_delete() {
        let config = mutating_webhook_configuration("infoblox-ipam", &service());
        let webhooks = config.webhooks.unwrap();
        assert_eq!(webhooks.len(), 1);

        let webhook = &webhooks[0];
        assert_eq!(webhook.name, WEBHOOK_NAME);
        assert_eq!(webhook.failure_policy.as_deref(), Some("Fail"));
        assert_eq!(webhook.side_effects, "NoneOnDryRun");

        let rule = &webhook.rules.as_ref().unwrap()[0];
        assert_eq!(rule.operations.as_ref().unwrap(), &vec!["CREATE".to_string(), "DELETE".to_string()]);
        assert_eq!(rule.resources.as_ref().unwrap(), &vec!["vspheremachines".to_string()]);

        let svc = webhook.client_config.service.as_ref().unwrap();
        assert_eq!(svc.path.as_deref(), Some("/infoblox-ipam"));
        assert_eq!(svc.port, Some(443));
    }

    #[test]
    fn test_webhook_renders_as_yaml() {
        let config = mutating_webhook_configuration("infoblox-ipam", &service());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("kind: MutatingWebhookConfiguration"));
        assert!(yaml.contains("sideEffects: NoneOnDryRun"));
    }
}
