//! Common utilities for the Infoblox WAPI client
//!
//! Provides the authenticated HTTP wrapper shared by all object operations.

use crate::error::InfobloxError;
use crate::models::WapiError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// HTTP client wrapper with basic authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    ///
    /// `base_url` is the versioned WAPI root, e.g. `https://gm:443/wapi/v2.10/`.
    pub fn new(client: Client, base_url: String, username: String, password: String) -> Self {
        let base_url = format!("{}/", base_url.trim_end_matches('/'));
        Self {
            client,
            base_url,
            username,
            password,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an object path (`record:a`) or reference
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
    }

    /// Make a GET request
    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, InfobloxError> {
        let url = self.with_query(self.build_url(path), query);
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(InfobloxError::Http)?;

        let response = Self::check_status("GET", path, response).await?;
        response.json().await.map_err(InfobloxError::Http)
    }

    /// Make a POST request
    pub async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<T, InfobloxError> {
        let url = self.with_query(self.build_url(path), query);
        debug!("POST {} with body: {}", url, body);

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(InfobloxError::Http)?;

        let response = Self::check_status("POST", path, response).await?;
        response.json().await.map_err(InfobloxError::Http)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), InfobloxError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(InfobloxError::Http)?;

        Self::check_status("DELETE", path, response).await?;
        Ok(())
    }

    /// Build query string from parameters
    pub fn build_query_string(&self, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn with_query(&self, url: String, query: &[(&str, &str)]) -> String {
        if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, self.build_query_string(query))
        }
    }

    async fn check_status(
        method: &str,
        path: &str,
        response: Response,
    ) -> Result<Response, InfobloxError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = wapi_error_text(&body);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InfobloxError::Authentication(
                format!("{} {} failed: {} - {}", method, path, status, detail),
            ),
            StatusCode::NOT_FOUND => {
                InfobloxError::NotFound(format!("{} {}: {}", method, path, detail))
            }
            _ => InfobloxError::Api(format!("{} {} failed: {} - {}", method, path, status, detail)),
        })
    }
}

/// Extract the human readable message from a WAPI error body, falling back to the raw body
pub fn wapi_error_text(body: &str) -> String {
    match serde_json::from_str::<WapiError>(body) {
        Ok(err) if !err.text.is_empty() => err.text,
        Ok(err) if !err.error.is_empty() => err.error,
        _ => body.chars().take(500).collect(),
    }
}
