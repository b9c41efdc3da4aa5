//! Public address lookup through an external echo service.

use std::time::Duration;

use serde::Deserialize;

use crate::VerifierError;

pub const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org?format=json";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Expected body: `{"ip": "198.51.100.7"}`.
#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

/// Asks an echo service which address this host appears from.
pub struct PublicIpLookup {
    url: String,
    http: reqwest::Client,
}

impl PublicIpLookup {
    pub fn new(url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.to_string(),
            http,
        }
    }

    pub async fn lookup(&self) -> Result<String, VerifierError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(VerifierError::from_transport)?;
        if !response.status().is_success() {
            return Err(VerifierError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        let echo: EchoResponse = response
            .json()
            .await
            .map_err(|e| VerifierError::InvalidResponse(e.to_string()))?;
        Ok(echo.ip)
    }
}

impl Default for PublicIpLookup {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_IP_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};

    #[tokio::test]
    async fn reads_ip_field() {
        let app = Router::new().route(
            "/",
            get(|| async { Json(serde_json::json!({ "ip": "198.51.100.7" })) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let lookup = PublicIpLookup::new(&format!("http://{addr}/"));
        assert_eq!(lookup.lookup().await.unwrap(), "198.51.100.7");
    }

    #[test]
    fn echo_response_ignores_extra_fields() {
        let echo: EchoResponse =
            serde_json::from_str(r#"{"ip":"2001:db8::1","country":"BR"}"#).unwrap();
        assert_eq!(echo.ip, "2001:db8::1");
    }
}
