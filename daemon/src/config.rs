//! Daemon configuration with TOML file support.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fraudgate_types::{VerificationResult, VerificationStatus};
use fraudgate_verifier::DEFAULT_PUBLIC_IP_URL;
use serde::{Deserialize, Serialize};

/// Port used by default.
pub const DEFAULT_PORT: u16 = 3000;

/// Port used with `--dev`.
pub const DEV_PORT: u16 = 3001;

/// Configuration for the fraudgate daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; any field
/// left out takes its default. CLI flags override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Interface to bind the HTTP server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to mount the Prometheus `/metrics` endpoint.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Where the `fingerprint` command keeps its storage file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Echo service used by `/api/ip-debug`. Empty disables the lookup.
    #[serde(default = "default_public_ip_url")]
    pub public_ip_url: String,

    #[serde(default)]
    pub verifier: VerifierConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierMode {
    /// Ask an HTTP scoring service.
    Remote,
    /// Answer every request with a fixed verdict.
    Static,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default = "default_verifier_mode")]
    pub mode: VerifierMode,

    #[serde(default = "default_verifier_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout for verification calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verdict returned in static mode.
    #[serde(default = "default_static_status")]
    pub static_status: VerificationStatus,

    #[serde(default)]
    pub static_risk_score: f64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./fraudgate_data")
}

fn default_public_ip_url() -> String {
    DEFAULT_PUBLIC_IP_URL.to_string()
}

fn default_verifier_mode() -> VerifierMode {
    VerifierMode::Remote
}

fn default_verifier_url() -> String {
    "https://sdk-antifraud.koyeb.app".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_static_status() -> VerificationStatus {
    VerificationStatus::Allow
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        addr.parse()
            .with_context(|| format!("invalid bind address {addr}"))
    }

    /// `None` when the lookup is disabled.
    pub fn public_ip_url(&self) -> Option<&str> {
        Some(self.public_ip_url.trim()).filter(|url| !url.is_empty())
    }
}

impl VerifierConfig {
    pub fn static_verdict(&self) -> VerificationResult {
        VerificationResult::new(self.static_status, self.static_risk_score)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            data_dir: default_data_dir(),
            public_ip_url: default_public_ip_url(),
            verifier: VerifierConfig::default(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: default_verifier_mode(),
            base_url: default_verifier_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            static_status: default_static_status(),
            static_risk_score: 0.0,
        }
    }
}
