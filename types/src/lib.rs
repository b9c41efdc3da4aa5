//! Fundamental types shared across every fraudgate crate.
//!
//! Fingerprint records produced by the collector, verification contexts
//! handed to a risk verifier, and the categorical results it returns.

pub mod error;
pub mod fingerprint;
pub mod time;
pub mod verification;

pub use error::TypesError;
pub use fingerprint::{
    BehaviorFingerprint, ConnectionInfo, DeviceFingerprint, Fingerprint, MemoryInfo,
    NetworkFingerprint, WebGlInfo, NETWORK_IP_PLACEHOLDER,
};
pub use time::Timestamp;
pub use verification::{
    ForwardedHeaders, VerificationContext, VerificationMode, VerificationResult,
    VerificationStatus,
};
