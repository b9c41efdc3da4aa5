//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use fraudgate_verifier::{PublicIpLookup, RiskVerifier, VerifierDiagnostics};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::handlers;
use crate::metrics::ApiMetrics;

/// Shared state handed to every handler.
pub struct AppState {
    pub verifier: Arc<dyn RiskVerifier>,
    pub diagnostics: Arc<dyn VerifierDiagnostics>,
    /// `None` disables the public address lookup on `/api/ip-debug`.
    pub public_ip: Option<Arc<PublicIpLookup>>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    /// State for a verifier that also answers the diagnostics calls.
    pub fn new<V>(verifier: Arc<V>, metrics: Arc<ApiMetrics>) -> Self
    where
        V: RiskVerifier + VerifierDiagnostics + 'static,
    {
        Self {
            verifier: verifier.clone(),
            diagnostics: verifier,
            public_ip: None,
            metrics,
        }
    }

    pub fn with_public_ip(mut self, lookup: PublicIpLookup) -> Self {
        self.public_ip = Some(Arc::new(lookup));
        self
    }
}

/// Build the router with every endpoint. `/metrics` is only mounted when
/// `enable_metrics` is set.
pub fn router(state: Arc<AppState>, enable_metrics: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/verify-ip", get(handlers::verify_ip))
        .route(handlers::DEMO_ROUTE, get(handlers::demo))
        .route(handlers::CHECKOUT_ROUTE, post(handlers::checkout))
        .route(handlers::TRANSFER_ROUTE, post(handlers::transfer))
        .route(handlers::PURCHASE_ROUTE, post(handlers::purchase))
        .route("/api/login", post(handlers::login))
        .route("/api/fingerprint", post(handlers::fingerprint))
        .route("/api/ip-debug", get(handlers::ip_debug))
        .route("/api/test-connection", get(handlers::test_connection));

    if enable_metrics {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// The HTTP server, configured with a bind address and shared state.
pub struct ApiServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub enable_metrics: bool,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, state: Arc<AppState>, enable_metrics: bool) -> Self {
        Self {
            addr,
            state,
            enable_metrics,
        }
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Peer addresses are recorded per connection so handlers can fall back
    /// to them when no forwarding header is present.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone(), self.enable_metrics);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ApiError::Server(format!("bind {}: {e}", self.addr)))?;
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::Server(e.to_string()))?;
        info!(
            addr = %local,
            verifier = self.state.verifier.name(),
            "API server listening on http://{local}"
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::Server(e.to_string()))?;

        info!("API server stopped");
        Ok(())
    }
}
