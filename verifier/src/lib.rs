//! Risk verifier interface.
//!
//! The server never scores risk itself. It builds a
//! [`VerificationContext`] and asks a [`RiskVerifier`] for a verdict;
//! what happens inside the verifier is not this crate's business.
//!
//! Implementations shipped here:
//! - [`RemoteVerifier`]: an HTTP scoring service.
//! - [`StaticVerifier`]: a fixed verdict, for offline demos.

pub mod error;
pub mod fixed;
pub mod public_ip;
pub mod remote;

use async_trait::async_trait;
use fraudgate_types::{VerificationContext, VerificationResult};
use serde::{Deserialize, Serialize};

pub use error::VerifierError;
pub use fixed::StaticVerifier;
pub use public_ip::{PublicIpLookup, DEFAULT_PUBLIC_IP_URL};
pub use remote::RemoteVerifier;

/// Produces a verdict for one request.
#[async_trait]
pub trait RiskVerifier: Send + Sync {
    async fn verify(
        &self,
        context: &VerificationContext,
    ) -> Result<VerificationResult, VerifierError>;

    /// Human-readable name of this verifier.
    fn name(&self) -> &str;
}

/// Connectivity self-checks against the verifier's backend.
#[async_trait]
pub trait VerifierDiagnostics: Send + Sync {
    /// Reachability probe. An `Err` means the backend could not be reached
    /// at all; a reachable backend reporting trouble yields
    /// `Ok` with [`ConnectionStatus::Error`].
    async fn test_connection(&self) -> Result<ConnectionReport, VerifierError>;

    /// Whatever metadata the backend publishes about itself.
    async fn api_info(&self) -> Result<serde_json::Value, VerifierError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub status: ConnectionStatus,
    pub message: String,
    pub latency_ms: u64,
}
