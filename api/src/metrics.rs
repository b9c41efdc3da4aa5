//! Prometheus metrics for the API.
//!
//! [`ApiMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use fraudgate_types::VerificationStatus;

use crate::policy::Scenario;

pub struct ApiMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,
    /// Verdicts received, by scenario and status.
    pub verdicts: IntCounterVec,
    /// Requests refused (HTTP 403) by scenario.
    pub blocked: IntCounterVec,
    /// Verifier calls that failed before producing a verdict.
    pub verifier_failures: IntCounter,
    /// Fingerprints accepted on the intake endpoint.
    pub fingerprints_received: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let verdicts = register_int_counter_vec_with_registry!(
            Opts::new(
                "fraudgate_verdicts_total",
                "Verifier verdicts received, by scenario and status"
            ),
            &["scenario", "status"],
            registry
        )?;

        let blocked = register_int_counter_vec_with_registry!(
            Opts::new("fraudgate_blocked_total", "Requests refused with HTTP 403"),
            &["scenario"],
            registry
        )?;

        let verifier_failures = register_int_counter_with_registry!(
            Opts::new(
                "fraudgate_verifier_failures_total",
                "Verifier calls that failed without a verdict"
            ),
            registry
        )?;

        let fingerprints_received = register_int_counter_with_registry!(
            Opts::new(
                "fraudgate_fingerprints_received_total",
                "Fingerprints accepted on the intake endpoint"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            verdicts,
            blocked,
            verifier_failures,
            fingerprints_received,
        })
    }

    pub fn record_verdict(&self, scenario: Scenario, status: VerificationStatus) {
        self.verdicts
            .with_label_values(&[scenario.as_str(), status.as_str()])
            .inc();
    }

    pub fn record_blocked(&self, scenario: Scenario) {
        self.blocked.with_label_values(&[scenario.as_str()]).inc();
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
