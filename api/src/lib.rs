//! HTTP surface of the fraud-check demo.
//!
//! Provides endpoints for:
//! - IP-only and full verification gates
//! - Business scenarios (checkout, transfer, credit purchase, login), each
//!   with its own reaction to the verifier's verdict
//! - Fingerprint intake, enriched with what the server observed
//! - Address and verifier connectivity diagnostics
//! - Health and Prometheus metrics

pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod policy;
pub mod server;

pub use client_ip::{resolve_client_ip, ClientMeta, FrameworkAddr};
pub use error::ApiError;
pub use metrics::ApiMetrics;
pub use server::{router, ApiServer, AppState};
