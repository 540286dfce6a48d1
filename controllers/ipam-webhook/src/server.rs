//! HTTPS surface of the webhook: the admission endpoint and health probes.
//!
//! The API server only calls admission webhooks over TLS, so the listener
//! serves the certificate from the configured certificate directory.

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::gatekeeper::Gatekeeper;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use capv_types::WEBHOOK_PATH;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(gatekeeper: Arc<Gatekeeper>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(admit))
        .route("/healthz", get(probe))
        .route("/readyz", get(probe))
        .layer(TraceLayer::new_for_http())
        .with_state(gatekeeper)
}

async fn admit(State(gatekeeper): State<Arc<Gatekeeper>>, body: Bytes) -> Response {
    let review: AdmissionReview<DynamicObject> = match serde_json::from_slice(&body) {
        Ok(review) => review,
        Err(e) => {
            warn!("Rejecting undecodable AdmissionReview: {}", e);
            return (StatusCode::BAD_REQUEST, format!("invalid AdmissionReview: {}", e))
                .into_response();
        }
    };

    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!("AdmissionReview carries no request: {}", e);
            return Json(AdmissionResponse::invalid(e.to_string()).into_review()).into_response();
        }
    };

    Json(gatekeeper.review(&request).await.into_review()).into_response()
}

async fn probe() -> &'static str {
    "ok"
}

/// In-flight reviews get this long to finish after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Load the serving certificate and key named by `config`
pub async fn load_tls(config: &WebhookConfig) -> Result<RustlsConfig, WebhookError> {
    let (cert, key) = (config.cert_path(), config.key_path());
    RustlsConfig::from_pem_file(&cert, &key).await.map_err(|e| {
        WebhookError::InvalidConfig(format!(
            "failed to load serving certificate {} / {}: {}",
            cert.display(),
            key.display(),
            e
        ))
    })
}

/// Serve `router` over TLS on `addr` until SIGTERM or Ctrl-C
pub async fn serve(addr: SocketAddr, router: Router, tls: RustlsConfig) -> Result<(), WebhookError> {
    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("Serving admission reviews over TLS on {}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{admission_review_json, machine_json, mock_client};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> (Router, infoblox_client::MockInfobloxClient) {
        let mock = mock_client();
        let config = WebhookConfig::from_lookup(|_| None).unwrap();
        let gatekeeper = Gatekeeper::new(Arc::new(mock.clone()), &config);
        (router(Arc::new(gatekeeper)), mock)
    }

    async fn post_review(router: Router, body: String) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(WEBHOOK_PATH)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_admission_round_trip() {
        let (router, mock) = app();
        let review = admission_review_json(
            "CREATE",
            Some(machine_json("vm1", &[&["infoblox:a:b:10.0.0.0/24"]])),
            None,
            false,
        );

        let (status, body) = post_review(router, review.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let reply: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply["kind"], "AdmissionReview");
        assert_eq!(reply["response"]["uid"], review["request"]["uid"]);
        assert_eq!(reply["response"]["allowed"], true);
        assert_eq!(reply["response"]["patchType"], "JSONPatch");
        assert_eq!(mock.allocated_names(), vec!["vm1-0-0"]);
    }

    #[tokio::test]
    async fn test_denied_review_carries_status_code() {
        let (router, _mock) = app();
        let review = admission_review_json("CONNECT", None, None, false);

        let (status, body) = post_review(router, review.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let reply: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply["response"]["allowed"], false);
        assert_eq!(reply["response"]["status"]["code"], 500);
        assert_eq!(reply["response"]["status"]["message"], "unsupported operation: Connect");
    }

    #[tokio::test]
    async fn test_garbage_body_is_bad_request() {
        let (router, mock) = app();

        let (status, _) = post_review(router, "not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(mock.allocations().is_empty());
    }

    fn cert_config(dir: &std::path::Path) -> WebhookConfig {
        let dir = dir.display().to_string();
        WebhookConfig::from_lookup(move |key| (key == "WEBHOOK_CERT_DIR").then(|| dir.clone()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_certificate_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("ipam-webhook-no-certs-{}", std::process::id()));

        let result = load_tls(&cert_config(&dir)).await;

        assert!(matches!(result, Err(WebhookError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_invalid_certificate_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("ipam-webhook-bad-certs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tls.crt"), "not a certificate").unwrap();
        std::fs::write(dir.join("tls.key"), "not a key").unwrap();

        let result = load_tls(&cert_config(&dir)).await;
        std::fs::remove_dir_all(&dir).unwrap();

        match result {
            Err(WebhookError::InvalidConfig(message)) => assert!(message.contains("tls.crt")),
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_probes() {
        for path in ["/healthz", "/readyz"] {
            let (router, _mock) = app();
            let response = router
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }
}
