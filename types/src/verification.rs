//! Verification requests and results exchanged with a risk verifier.
//!
//! The verifier itself is opaque; this module only fixes the shape of what
//! goes in (a [`VerificationContext`]) and what comes back (a
//! [`VerificationResult`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Categorical outcome of a verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Allow,
    Review,
    Deny,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Review => "REVIEW",
            Self::Deny => "DENY",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(Self::Allow),
            "REVIEW" => Ok(Self::Review),
            "DENY" => Ok(Self::Deny),
            _ => Err(TypesError::UnknownStatus(s.to_string())),
        }
    }
}

/// What a verifier reports for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub status: VerificationStatus,
    /// 0–100 by convention; higher is riskier.
    pub risk_score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl VerificationResult {
    pub fn new(status: VerificationStatus, risk_score: f64) -> Self {
        Self {
            status,
            risk_score,
            reasons: Vec::new(),
        }
    }

    pub fn with_reasons<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reasons = reasons.into_iter().map(Into::into).collect();
        self
    }
}

/// Which kind of check the caller wants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VerificationMode {
    /// Reputation of the client address alone.
    IpOnly,
    /// Address plus route and (optionally) user context.
    #[serde(rename_all = "camelCase")]
    Advanced {
        route: String,
        user_id: Option<String>,
    },
}

impl VerificationMode {
    pub fn advanced(route: impl Into<String>, user_id: Option<&str>) -> Self {
        Self::Advanced {
            route: route.into(),
            user_id: user_id.map(str::to_string),
        }
    }
}

/// Client forwarding headers as received, before any resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForwardedHeaders {
    pub x_forwarded_for: Option<String>,
    pub x_real_ip: Option<String>,
    pub cf_connecting_ip: Option<String>,
    pub x_client_ip: Option<String>,
}

/// Everything the server knows about a request when asking for a verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationContext {
    pub mode: VerificationMode,
    /// Best-known client address.
    pub ip: String,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub forwarded: ForwardedHeaders,
}
