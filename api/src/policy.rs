//! Per-scenario decision policy.
//!
//! Each business scenario maps a verifier verdict to its own outcome. Some
//! branch on the categorical status, others on a raw score threshold; the
//! thresholds are business choices made per scenario and are kept as they
//! are.

use fraudgate_types::{VerificationResult, VerificationStatus};

/// Checkout asks for extra authentication above this score.
pub const CHECKOUT_AUTH_THRESHOLD: f64 = 70.0;

/// Transfers are held for manual approval above this score.
pub const TRANSFER_APPROVAL_THRESHOLD: f64 = 80.0;

/// Credit purchases are flagged for phone verification above this score.
pub const PURCHASE_WARNING_THRESHOLD: f64 = 60.0;

/// Logins require a second factor above this score.
pub const LOGIN_2FA_THRESHOLD: f64 = 70.0;

/// Logins below this score are reported as low risk.
pub const LOGIN_LOW_RISK_CEILING: f64 = 30.0;

/// The business scenarios exposed over HTTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scenario {
    IpCheck,
    FullVerification,
    Checkout,
    Transfer,
    Purchase,
    Login,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpCheck => "ip_check",
            Self::FullVerification => "full_verification",
            Self::Checkout => "checkout",
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
            Self::Login => "login",
        }
    }

    /// Label echoed to clients as `useCase`.
    pub fn use_case(&self) -> &'static str {
        match self {
            Self::IpCheck => "IP check",
            Self::FullVerification => "Full verification",
            Self::Checkout => "E-commerce - strict rules",
            Self::Transfer => "Banking - lenient rules",
            Self::Purchase => "Gaming - custom rules",
            Self::Login => "Login - IP verification",
        }
    }
}

/// Outcome for the plain gate endpoints (IP-only and full verification).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Review,
    Block,
}

pub fn gate(result: &VerificationResult) -> GateDecision {
    match result.status {
        VerificationStatus::Deny => GateDecision::Block,
        VerificationStatus::Review => GateDecision::Review,
        VerificationStatus::Allow => GateDecision::Pass,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutDecision {
    Blocked,
    NeedsAuth,
    Confirmed,
}

/// DENY blocks outright; otherwise a score above the threshold asks for
/// extra authentication.
pub fn checkout(result: &VerificationResult) -> CheckoutDecision {
    if result.status == VerificationStatus::Deny {
        CheckoutDecision::Blocked
    } else if result.risk_score > CHECKOUT_AUTH_THRESHOLD {
        CheckoutDecision::NeedsAuth
    } else {
        CheckoutDecision::Confirmed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDecision {
    PendingApproval,
    /// `flagged` is set when the verifier said DENY but the transfer goes
    /// through anyway.
    Confirmed { flagged: bool },
}

/// Transfers are never blocked.
pub fn transfer(result: &VerificationResult) -> TransferDecision {
    if result.risk_score > TRANSFER_APPROVAL_THRESHOLD {
        TransferDecision::PendingApproval
    } else {
        TransferDecision::Confirmed {
            flagged: result.status == VerificationStatus::Deny,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseDecision {
    ConfirmedWithWarning,
    Confirmed,
}

/// Purchases always go through; risky ones carry a warning.
pub fn purchase(result: &VerificationResult) -> PurchaseDecision {
    if result.risk_score > PURCHASE_WARNING_THRESHOLD {
        PurchaseDecision::ConfirmedWithWarning
    } else {
        PurchaseDecision::Confirmed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginDecision {
    RequiresTwoFactor,
    Granted(RiskLevel),
}

pub fn login(result: &VerificationResult) -> LoginDecision {
    if result.risk_score > LOGIN_2FA_THRESHOLD {
        LoginDecision::RequiresTwoFactor
    } else if result.risk_score < LOGIN_LOW_RISK_CEILING {
        LoginDecision::Granted(RiskLevel::Low)
    } else {
        LoginDecision::Granted(RiskLevel::Medium)
    }
}
