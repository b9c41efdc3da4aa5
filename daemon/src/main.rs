//! fraudgate daemon: entry point for the fraud-check demo server.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use fraudgate_api::{ApiMetrics, ApiServer, AppState};
use fraudgate_fingerprint::{FileStore, FingerprintCollector, ProcessEnvironment, SystemClock};
use fraudgate_utils::{init_logging, LogFormat};
use fraudgate_verifier::{
    ConnectionStatus, PublicIpLookup, RemoteVerifier, StaticVerifier, VerifierDiagnostics,
};

use crate::config::{DaemonConfig, VerifierMode, DEV_PORT};

/// File the `fingerprint` command persists its session and counters in.
const FINGERPRINT_STORE_FILE: &str = "fingerprint_store.json";

#[derive(Parser)]
#[command(name = "fraudgate", about = "Fraud-check demo server and fingerprint collector")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "FRAUDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FRAUDGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "FRAUDGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Data directory for the fingerprint store.
    #[arg(long, env = "FRAUDGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Interface to bind to.
        #[arg(long, env = "FRAUDGATE_BIND")]
        bind: Option<String>,

        /// Port to listen on.
        #[arg(long, env = "FRAUDGATE_PORT")]
        port: Option<u16>,

        /// Development mode: listen on 3001 unless a port is given.
        #[arg(long, env = "FRAUDGATE_DEV")]
        dev: bool,

        /// Enable Prometheus metrics endpoint.
        #[arg(long, env = "FRAUDGATE_ENABLE_METRICS")]
        metrics: bool,

        /// Base URL of the remote risk verifier.
        #[arg(long, env = "FRAUDGATE_VERIFIER_URL")]
        verifier_url: Option<String>,

        /// API key sent to the remote verifier.
        #[arg(long, env = "FRAUDGATE_VERIFIER_API_KEY")]
        verifier_api_key: Option<String>,

        /// Answer every request with the configured static verdict instead
        /// of calling a remote verifier.
        #[arg(long, env = "FRAUDGATE_STATIC_VERIFIER")]
        static_verifier: bool,
    },

    /// Collect a fingerprint of this process and print it as JSON.
    Fingerprint {
        /// User id to attach.
        #[arg(long)]
        user_id: Option<String>,

        /// Submit the fingerprint to a running server's `/api/fingerprint`
        /// (e.g. "http://localhost:3000") and print its reply instead.
        #[arg(long)]
        submit: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let log_format: LogFormat = config.log_format.parse()?;
    init_logging(log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Serve {
            bind,
            port,
            dev,
            metrics,
            verifier_url,
            verifier_api_key,
            static_verifier,
        } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            config.port = match (port, dev) {
                (Some(port), _) => port,
                (None, true) => DEV_PORT,
                (None, false) => config.port,
            };
            config.enable_metrics |= metrics;
            if let Some(url) = verifier_url {
                config.verifier.base_url = url;
            }
            if verifier_api_key.is_some() {
                config.verifier.api_key = verifier_api_key;
            }
            if static_verifier {
                config.verifier.mode = VerifierMode::Static;
            }
            serve(config).await?;
        }
        Command::Fingerprint { user_id, submit } => {
            fingerprint(&config, user_id.as_deref(), submit.as_deref()).await?;
        }
    }

    Ok(())
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let metrics = Arc::new(ApiMetrics::new().context("registering metrics")?);

    let mut state = match config.verifier.mode {
        VerifierMode::Remote => {
            let timeout = Duration::from_secs(config.verifier.timeout_secs);
            let mut verifier = RemoteVerifier::with_timeout(&config.verifier.base_url, timeout)
                .context("configuring remote verifier")?;
            if let Some(key) = &config.verifier.api_key {
                verifier = verifier.with_api_key(key.clone());
            }
            tracing::info!("Using remote verifier at {}", verifier.base_url());
            AppState::new(Arc::new(verifier), metrics)
        }
        VerifierMode::Static => {
            let verdict = config.verifier.static_verdict();
            tracing::info!(
                "Using static verifier ({} / {})",
                verdict.status,
                verdict.risk_score
            );
            AppState::new(Arc::new(StaticVerifier::new(verdict)), metrics)
        }
    };
    if let Some(url) = config.public_ip_url() {
        state = state.with_public_ip(PublicIpLookup::new(url));
    }
    let state = Arc::new(state);

    tokio::spawn(startup_connectivity_check(state.diagnostics.clone()));

    let server = ApiServer::new(addr, state, config.enable_metrics);
    server.start(shutdown_signal()).await?;

    tracing::info!("fraudgate daemon exited cleanly");
    Ok(())
}

/// Probe the verifier once at startup. The outcome is only logged.
async fn startup_connectivity_check(diagnostics: Arc<dyn VerifierDiagnostics>) {
    tracing::info!("Testing verifier connectivity");
    match diagnostics.test_connection().await {
        Ok(report) if report.status == ConnectionStatus::Ok => {
            tracing::info!(latency_ms = report.latency_ms, "Verifier reachable");
        }
        Ok(report) => {
            tracing::warn!(latency_ms = report.latency_ms, "Verifier reports a problem: {}", report.message);
        }
        Err(e) => {
            tracing::warn!(details = e.details(), "Verifier connectivity test failed: {e}");
        }
    }
}

async fn fingerprint(
    config: &DaemonConfig,
    user_id: Option<&str>,
    submit: Option<&str>,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;
    let store = FileStore::open(config.data_dir.join(FINGERPRINT_STORE_FILE))?;
    tracing::debug!(path = %store.path().display(), "fingerprint store opened");
    let env = ProcessEnvironment::new("fraudgate", env!("CARGO_PKG_VERSION"));
    let collector =
        FingerprintCollector::from_store(Arc::new(store), Arc::new(env), Arc::new(SystemClock));

    let fp = collector.collect_complete(user_id);
    tracing::debug!(session_id = %collector.session_id(), "fingerprint collected");

    let output = match submit {
        None => serde_json::to_value(&fp)?,
        Some(base) => {
            let url = format!("{}/api/fingerprint", base.trim_end_matches('/'));
            let response = reqwest::Client::new()
                .post(&url)
                .json(&serde_json::json!({ "fingerprint": fp }))
                .send()
                .await
                .with_context(|| format!("submitting fingerprint to {url}"))?;
            let status = response.status();
            let body: serde_json::Value = response.json().await?;
            if !status.is_success() {
                anyhow::bail!("server answered HTTP {status}: {body}");
            }
            body
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
    }
}
