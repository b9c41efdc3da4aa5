//! Nullable verifier: scripted verdicts and recorded contexts.

use async_trait::async_trait;
use fraudgate_types::{VerificationContext, VerificationResult, VerificationStatus};
use fraudgate_verifier::{
    ConnectionReport, ConnectionStatus, RiskVerifier, VerifierDiagnostics, VerifierError,
};
use std::sync::Mutex;

enum Script {
    Verdict(VerificationResult),
    Unreachable(String),
}

/// A verifier that answers with a configured verdict (or failure) and
/// remembers every context it was asked about.
pub struct NullVerifier {
    script: Mutex<Script>,
    seen: Mutex<Vec<VerificationContext>>,
}

impl NullVerifier {
    pub fn returning(result: VerificationResult) -> Self {
        Self {
            script: Mutex::new(Script::Verdict(result)),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a verdict without reasons.
    pub fn with(status: VerificationStatus, risk_score: f64) -> Self {
        Self::returning(VerificationResult::new(status, risk_score))
    }

    /// Every call fails as if the backend were down.
    pub fn unreachable(message: &str) -> Self {
        Self {
            script: Mutex::new(Script::Unreachable(message.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Replace the scripted verdict.
    pub fn set_result(&self, result: VerificationResult) {
        *self.script.lock().unwrap() = Script::Verdict(result);
    }

    /// Contexts received so far, oldest first.
    pub fn contexts(&self) -> Vec<VerificationContext> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_context(&self) -> Option<VerificationContext> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RiskVerifier for NullVerifier {
    async fn verify(
        &self,
        context: &VerificationContext,
    ) -> Result<VerificationResult, VerifierError> {
        self.seen.lock().unwrap().push(context.clone());
        match &*self.script.lock().unwrap() {
            Script::Verdict(result) => Ok(result.clone()),
            Script::Unreachable(msg) => Err(VerifierError::Unreachable(msg.clone())),
        }
    }

    fn name(&self) -> &str {
        "null-verifier"
    }
}

#[async_trait]
impl VerifierDiagnostics for NullVerifier {
    async fn test_connection(&self) -> Result<ConnectionReport, VerifierError> {
        match &*self.script.lock().unwrap() {
            Script::Verdict(_) => Ok(ConnectionReport {
                status: ConnectionStatus::Ok,
                message: "null verifier".into(),
                latency_ms: 0,
            }),
            Script::Unreachable(msg) => Err(VerifierError::Unreachable(msg.clone())),
        }
    }

    async fn api_info(&self) -> Result<serde_json::Value, VerifierError> {
        match &*self.script.lock().unwrap() {
            Script::Verdict(_) => Ok(serde_json::json!({ "name": "null-verifier" })),
            Script::Unreachable(msg) => Err(VerifierError::Upstream {
                status: 503,
                body: msg.clone(),
            }),
        }
    }
}
