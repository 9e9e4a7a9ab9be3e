/// Backend service client
///
/// The reporting/payroll/compliance backend owns computation; this service
/// only forwards tenant-scoped calls to it. Every call carries the tenant in
/// `x-org-id` and the request id in `x-request-id`.
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("backend is not configured")]
    NotConfigured,
    #[error("backend timed out")]
    Timeout,
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend returned status {status}")]
    Status { status: u16, body: Option<Value> },
    #[error("backend body could not be decoded: {0}")]
    Decode(String),
}

/// Successful (2xx) backend reply. `body` is `Null` for empty bodies.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    service_token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str, service_token: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("finboard-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_token: service_token.filter(|t| !t.is_empty()),
        })
    }

    /// `None` when no base URL is configured.
    pub fn from_config(config: &BackendConfig) -> Result<Option<Self>, reqwest::Error> {
        if config.base_url.trim().is_empty() {
            tracing::info!("Backend service not configured; proxied routes will report not_configured");
            return Ok(None);
        }
        tracing::info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "Backend service client configured"
        );
        Self::new(
            &config.base_url,
            config.service_token.clone(),
            Duration::from_millis(config.timeout_ms),
        )
        .map(Some)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, org_id: &str, request_id: &str) -> Result<BackendResponse, UpstreamError> {
        self.send(self.http.get(self.url(path)), org_id, request_id).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        org_id: &str,
        request_id: &str,
        body: &B,
    ) -> Result<BackendResponse, UpstreamError> {
        self.send(self.http.post(self.url(path)).json(body), org_id, request_id)
            .await
    }

    /// Readiness check against the backend's own health endpoint.
    pub async fn ping(&self) -> Result<(), UpstreamError> {
        let res = self.http.get(self.url("/health")).send().await.map_err(classify)?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status {
                status: res.status().as_u16(),
                body: None,
            })
        }
    }

    async fn send(&self, builder: RequestBuilder, org_id: &str, request_id: &str) -> Result<BackendResponse, UpstreamError> {
        let mut builder = builder
            .header("x-org-id", org_id)
            .header("x-request-id", request_id);
        if let Some(token) = &self.service_token {
            builder = builder.bearer_auth(token);
        }

        let res = builder.send().await.map_err(classify)?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(classify)?;

        if !status.is_success() {
            tracing::warn!(
                request_id = %request_id,
                status = status.as_u16(),
                "Backend returned an error status"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: serde_json::from_slice(&bytes).ok(),
            });
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?
        };

        Ok(BackendResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else if e.is_decode() {
        UpstreamError::Decode(e.to_string())
    } else {
        UpstreamError::Unreachable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_url_means_not_configured() {
        let config = BackendConfig::default();
        assert!(BackendClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://backend.local/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/cfo/snapshot"), "http://backend.local/cfo/snapshot");
    }

    #[test]
    fn blank_service_token_is_dropped() {
        let client = BackendClient::new("http://b", Some(String::new()), Duration::from_secs(1)).unwrap();
        assert!(client.service_token.is_none());
    }
}
