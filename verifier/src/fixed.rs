//! A verifier that always answers the same way.

use async_trait::async_trait;
use fraudgate_types::{VerificationContext, VerificationResult};

use crate::{ConnectionReport, ConnectionStatus, RiskVerifier, VerifierDiagnostics, VerifierError};

/// Returns one configured verdict for every request. Useful for running the
/// demo without a scoring backend.
#[derive(Clone, Debug)]
pub struct StaticVerifier {
    result: VerificationResult,
}

impl StaticVerifier {
    pub fn new(result: VerificationResult) -> Self {
        Self { result }
    }
}

#[async_trait]
impl RiskVerifier for StaticVerifier {
    async fn verify(
        &self,
        _context: &VerificationContext,
    ) -> Result<VerificationResult, VerifierError> {
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[async_trait]
impl VerifierDiagnostics for StaticVerifier {
    async fn test_connection(&self) -> Result<ConnectionReport, VerifierError> {
        Ok(ConnectionReport {
            status: ConnectionStatus::Ok,
            message: "static verifier has no backend".to_string(),
            latency_ms: 0,
        })
    }

    async fn api_info(&self) -> Result<serde_json::Value, VerifierError> {
        Ok(serde_json::json!({
            "mode": "static",
            "status": self.result.status,
            "riskScore": self.result.risk_score,
        }))
    }
}
