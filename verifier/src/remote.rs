//! HTTP client for a remote risk-scoring service.
//!
//! Wire contract:
//! - `POST {base}/api/v1/verify` with a JSON [`VerificationContext`],
//!   answered by a JSON [`VerificationResult`];
//! - `GET {base}/health` for the connectivity probe;
//! - `GET {base}/api/v1/info` for service metadata.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use fraudgate_types::{VerificationContext, VerificationResult};
use tracing::debug;

use crate::{ConnectionReport, ConnectionStatus, RiskVerifier, VerifierDiagnostics, VerifierError};

/// Default timeout for verification requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout applied to the connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the API key, when one is configured.
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct RemoteVerifier {
    base_url: String,
    api_key: Option<String>,
    /// HTTP client (reusable connection pool).
    http: reqwest::Client,
    timeout: Duration,
}

impl RemoteVerifier {
    pub fn new(base_url: &str) -> Result<Self, VerifierError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Fails with [`VerifierError::Config`] unless `base_url` is an absolute
    /// http(s) URL.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, VerifierError> {
        let base_url = base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| VerifierError::Config(format!("invalid base url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(VerifierError::Config(format!(
                "base url {base_url:?} must be an http(s) address"
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| VerifierError::Config(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.to_string(),
            api_key: None,
            http,
            timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url).timeout(timeout);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        req
    }
}

/// Turn a non-success response into [`VerifierError::Upstream`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, VerifierError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VerifierError::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RiskVerifier for RemoteVerifier {
    async fn verify(
        &self,
        context: &VerificationContext,
    ) -> Result<VerificationResult, VerifierError> {
        let response = self
            .request(reqwest::Method::POST, "/api/v1/verify", self.timeout)
            .json(context)
            .send()
            .await
            .map_err(VerifierError::from_transport)?;
        let response = ensure_success(response).await?;

        let result: VerificationResult = response.json().await.map_err(|e| {
            VerifierError::InvalidResponse(format!("failed to parse verification result: {e}"))
        })?;
        debug!(ip = %context.ip, status = %result.status, score = result.risk_score, "remote verdict");
        Ok(result)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[async_trait]
impl VerifierDiagnostics for RemoteVerifier {
    async fn test_connection(&self) -> Result<ConnectionReport, VerifierError> {
        let started = Instant::now();
        let response = self
            .request(reqwest::Method::GET, "/health", PROBE_TIMEOUT)
            .send()
            .await
            .map_err(VerifierError::from_transport)?;
        let latency_ms = started.elapsed().as_millis() as u64;
        let status = response.status();

        let report = if status.is_success() {
            ConnectionReport {
                status: ConnectionStatus::Ok,
                message: format!("{} reachable", self.base_url),
                latency_ms,
            }
        } else {
            ConnectionReport {
                status: ConnectionStatus::Error,
                message: format!("{} answered HTTP {}", self.base_url, status.as_u16()),
                latency_ms,
            }
        };
        Ok(report)
    }

    async fn api_info(&self) -> Result<serde_json::Value, VerifierError> {
        let response = self
            .request(reqwest::Method::GET, "/api/v1/info", PROBE_TIMEOUT)
            .send()
            .await
            .map_err(VerifierError::from_transport)?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| VerifierError::InvalidResponse(format!("failed to parse api info: {e}")))
    }
}
