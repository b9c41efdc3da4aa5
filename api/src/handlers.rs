//! Request handlers.
//!
//! Gate and scenario handlers share one flow: resolve the client, ask the
//! verifier, then let the scenario's policy pick the response. Verifier
//! failures surface as [`ApiError::Verifier`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use fraudgate_types::{Timestamp, VerificationMode, VerificationResult};
use fraudgate_utils::{generate_order_id, generate_token, now_iso};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client_ip::{ClientMeta, CF_CONNECTING_IP, X_CLIENT_IP, X_FORWARDED_FOR, X_REAL_IP};
use crate::error::ApiError;
use crate::policy::{self, CheckoutDecision, GateDecision, LoginDecision, PurchaseDecision};
use crate::policy::{Scenario, TransferDecision};
use crate::server::AppState;

pub const DEMO_ROUTE: &str = "/api/demo";
pub const DEMO_USER: &str = "demo-user";
pub const CHECKOUT_ROUTE: &str = "/api/ecommerce";
pub const TRANSFER_ROUTE: &str = "/api/banking";
pub const PURCHASE_ROUTE: &str = "/api/gaming";

const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

type SharedState = State<Arc<AppState>>;

// ── Helpers ──────────────────────────────────────────────────────────────

/// Ask the verifier and record the outcome.
async fn verify(
    state: &AppState,
    scenario: Scenario,
    client: &ClientMeta,
    mode: VerificationMode,
) -> Result<VerificationResult, ApiError> {
    debug!(
        scenario = scenario.as_str(),
        ip = %client.ip,
        framework_ip = ?client.framework_ip,
        forwarded = ?client.forwarded,
        "client address resolved"
    );
    match state.verifier.verify(&client.context(mode)).await {
        Ok(result) => {
            info!(
                scenario = scenario.as_str(),
                ip = %client.ip,
                status = %result.status,
                risk_score = result.risk_score,
                "verdict received"
            );
            state.metrics.record_verdict(scenario, result.status);
            Ok(result)
        }
        Err(e) => {
            warn!(
                scenario = scenario.as_str(),
                verifier = state.verifier.name(),
                "verification failed: {e}"
            );
            state.metrics.verifier_failures.inc();
            Err(e.into())
        }
    }
}

/// An absent or blank body reads as the request's defaults.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

fn gate_status(decision: GateDecision) -> StatusCode {
    match decision {
        GateDecision::Block => StatusCode::FORBIDDEN,
        GateDecision::Review => StatusCode::ACCEPTED,
        GateDecision::Pass => StatusCode::OK,
    }
}

fn object_len(value: &Value, key: &str) -> usize {
    value
        .get(key)
        .and_then(Value::as_object)
        .map_or(0, |o| o.len())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ── Request bodies ───────────────────────────────────────────────────────
//
// Fields are kept as raw JSON and echoed back as sent. Only absent fields
// take the default; an explicit `null` is echoed as `null`.

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    pub amount: Value,
    pub product: Value,
}

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self {
            amount: json!(100),
            product: json!("Produto Demo"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransferRequest {
    pub amount: Value,
    pub recipient: Value,
}

impl Default for TransferRequest {
    fn default() -> Self {
        Self {
            amount: json!(1000),
            recipient: json!("Conta Demo"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PurchaseRequest {
    pub credits: Value,
}

impl Default for PurchaseRequest {
    fn default() -> Self {
        Self {
            credits: json!(100),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Value,
}

impl Default for LoginRequest {
    fn default() -> Self {
        Self {
            username: json!("demo@example.com"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FingerprintSubmission {
    pub fingerprint: Option<Value>,
}

// ── Gates ────────────────────────────────────────────────────────────────

/// `GET /api/verify-ip`
pub async fn verify_ip(State(state): SharedState, client: ClientMeta) -> Result<Response, ApiError> {
    let scenario = Scenario::IpCheck;
    let result = verify(&state, scenario, &client, VerificationMode::IpOnly).await?;
    let decision = policy::gate(&result);

    let message = match decision {
        GateDecision::Block => "IP blocked: high risk detected",
        GateDecision::Review => "IP under review: moderate risk",
        GateDecision::Pass => "IP verification completed",
    };
    if decision == GateDecision::Block {
        state.metrics.record_blocked(scenario);
    }

    let body = json!({
        "success": decision != GateDecision::Block,
        "message": message,
        "verification": result,
        "detectedIps": {
            "frameworkIp": client.framework_ip.map(|ip| ip.to_string()),
            "realIp": client.ip,
            "isLocalhost": client.is_localhost(),
        },
        "timestamp": now_iso(),
    });
    Ok((gate_status(decision), Json(body)).into_response())
}

/// `GET /api/demo`
pub async fn demo(State(state): SharedState, client: ClientMeta) -> Result<Response, ApiError> {
    let scenario = Scenario::FullVerification;
    let mode = VerificationMode::advanced(DEMO_ROUTE, Some(DEMO_USER));
    let result = verify(&state, scenario, &client, mode).await?;
    let decision = policy::gate(&result);

    let message = match decision {
        GateDecision::Block => "Access denied: high risk detected",
        GateDecision::Review => "Access under review: moderate risk",
        GateDecision::Pass => "Full verification completed",
    };
    if decision == GateDecision::Block {
        state.metrics.record_blocked(scenario);
    }

    let body = json!({
        "success": decision != GateDecision::Block,
        "message": message,
        "verification": result,
        "timestamp": now_iso(),
        "requestInfo": {
            "ip": client.framework_ip.map(|ip| ip.to_string()),
            "userAgent": client.user_agent,
            "language": client.accept_language,
        },
    });
    Ok((gate_status(decision), NO_CACHE, Json(body)).into_response())
}

// ── Scenarios ────────────────────────────────────────────────────────────

/// `POST /api/ecommerce`
pub async fn checkout(
    State(state): SharedState,
    client: ClientMeta,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: CheckoutRequest = parse_body(&body)?;
    let scenario = Scenario::Checkout;
    let mode = VerificationMode::advanced(CHECKOUT_ROUTE, None);
    let result = verify(&state, scenario, &client, mode).await?;

    let response = match policy::checkout(&result) {
        CheckoutDecision::Blocked => {
            state.metrics.record_blocked(scenario);
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "success": false,
                    "message": "Transaction blocked: high risk",
                    "riskScore": result.risk_score,
                    "reasons": result.reasons,
                    "useCase": scenario.use_case(),
                })),
            )
        }
        CheckoutDecision::NeedsAuth => (
            StatusCode::ACCEPTED,
            Json(json!({
                "success": false,
                "message": "Additional verification required",
                "requiresAuth": true,
                "riskScore": result.risk_score,
                "useCase": scenario.use_case(),
            })),
        ),
        CheckoutDecision::Confirmed => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Purchase completed",
                "orderId": generate_order_id(Timestamp::now()),
                "product": req.product,
                "amount": req.amount,
                "riskScore": result.risk_score,
                "useCase": scenario.use_case(),
            })),
        ),
    };
    Ok(response.into_response())
}

/// `POST /api/banking`
///
/// Transfers are never refused. High scores hold the transfer for manual
/// approval; a DENY below that threshold is logged and the transfer goes
/// through.
pub async fn transfer(
    State(state): SharedState,
    client: ClientMeta,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: TransferRequest = parse_body(&body)?;
    let scenario = Scenario::Transfer;
    let mode = VerificationMode::advanced(TRANSFER_ROUTE, None);
    let result = verify(&state, scenario, &client, mode).await?;
    let transaction_id = generate_order_id(Timestamp::now());

    let body = match policy::transfer(&result) {
        TransferDecision::PendingApproval => {
            info!(%transaction_id, risk_score = result.risk_score, "transfer held for approval");
            json!({
                "success": true,
                "message": "Transfer held for manual review",
                "status": "pending_approval",
                "transactionId": transaction_id,
                "amount": req.amount,
                "recipient": req.recipient,
                "riskScore": result.risk_score,
                "useCase": scenario.use_case(),
            })
        }
        TransferDecision::Confirmed { flagged } => {
            if flagged {
                warn!(
                    %transaction_id,
                    risk_score = result.risk_score,
                    reasons = ?result.reasons,
                    "high risk detected, allowing transfer"
                );
            }
            json!({
                "success": true,
                "message": "Transfer processed",
                "transactionId": transaction_id,
                "amount": req.amount,
                "recipient": req.recipient,
                "riskScore": result.risk_score,
                "useCase": scenario.use_case(),
            })
        }
    };
    Ok(Json(body))
}

/// `POST /api/gaming`
pub async fn purchase(
    State(state): SharedState,
    client: ClientMeta,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: PurchaseRequest = parse_body(&body)?;
    let scenario = Scenario::Purchase;
    let mode = VerificationMode::advanced(PURCHASE_ROUTE, None);
    let result = verify(&state, scenario, &client, mode).await?;

    let body = match policy::purchase(&result) {
        PurchaseDecision::ConfirmedWithWarning => json!({
            "success": true,
            "message": "Purchase completed with security alert",
            "warning": "Suspicious account detected",
            "requiresPhoneVerification": true,
            "credits": req.credits,
            "riskScore": result.risk_score,
            "useCase": scenario.use_case(),
        }),
        PurchaseDecision::Confirmed => json!({
            "success": true,
            "message": "Credits purchased",
            "credits": req.credits,
            "riskScore": result.risk_score,
            "useCase": scenario.use_case(),
        }),
    };
    Ok(Json(body))
}

/// `POST /api/login`
///
/// Uses the IP-only check, not the advanced one.
pub async fn login(
    State(state): SharedState,
    client: ClientMeta,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: LoginRequest = parse_body(&body)?;
    let scenario = Scenario::Login;
    let result = verify(&state, scenario, &client, VerificationMode::IpOnly).await?;

    let body = match policy::login(&result) {
        LoginDecision::RequiresTwoFactor => json!({
            "success": false,
            "message": "Additional verification required",
            "requires2FA": true,
            "username": req.username,
            "riskScore": result.risk_score,
            "useCase": scenario.use_case(),
        }),
        LoginDecision::Granted(level) => json!({
            "success": true,
            "message": "Login successful",
            "token": generate_token(Timestamp::now()),
            "username": req.username,
            "riskLevel": level.as_str(),
            "riskScore": result.risk_score,
            "useCase": scenario.use_case(),
        }),
    };
    Ok(Json(body))
}

// ── Fingerprint intake ───────────────────────────────────────────────────

/// `POST /api/fingerprint`
///
/// Echoes the submitted fingerprint, an enhanced copy carrying what the
/// server observed, and per-section field counts.
pub async fn fingerprint(
    State(state): SharedState,
    client: ClientMeta,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let submission: FingerprintSubmission = parse_body(&body)?;
    let original = match submission.fingerprint {
        None | Some(Value::Null) => {
            return Err(ApiError::MissingInput("Fingerprint data is required".into()))
        }
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ApiError::InvalidBody(
                "fingerprint must be a JSON object".into(),
            ))
        }
    };

    let server = json!({
        "serverTimestamp": now_iso(),
        "userAgent": client.user_agent,
        "ip": client.ip,
        "headers": {
            X_FORWARDED_FOR: header_value(&headers, X_FORWARDED_FOR),
            X_REAL_IP: header_value(&headers, X_REAL_IP),
            CF_CONNECTING_IP: header_value(&headers, CF_CONNECTING_IP),
        },
    });
    let server_fields = server.as_object().map_or(0, |o| o.len());

    let original = Value::Object(original);
    let mut enhanced = original.clone();
    if let Some(map) = enhanced.as_object_mut() {
        map.insert("server".into(), server);
        map.insert("processed".into(), Value::Bool(true));
    }

    let device = object_len(&original, "device");
    let behavior = object_len(&original, "behavior");
    let network = object_len(&original, "network");
    info!(
        ip = %client.ip,
        device, behavior, network, server_fields,
        "fingerprint processed"
    );
    state.metrics.fingerprints_received.inc();

    Ok(Json(json!({
        "success": true,
        "message": "Fingerprint processed",
        "data": {
            "original": original,
            "enhanced": enhanced,
            "summary": {
                "deviceFields": device,
                "behaviorFields": behavior,
                "networkFields": network,
                "serverFields": server_fields,
                "totalFields": device + behavior + network + server_fields,
            },
        },
        "timestamp": now_iso(),
    })))
}

// ── Diagnostics ──────────────────────────────────────────────────────────

/// `GET /api/ip-debug`
pub async fn ip_debug(
    State(state): SharedState,
    client: ClientMeta,
    headers: HeaderMap,
) -> Json<Value> {
    let public_ip = match &state.public_ip {
        Some(lookup) => match lookup.lookup().await {
            Ok(ip) => Some(ip),
            Err(e) => {
                warn!("public IP lookup failed: {e}");
                None
            }
        },
        None => None,
    };

    // Only the IPv4 loopback gets the localhost advice; `isLocalhost` is broader.
    let why_localhost = if client.ip == "127.0.0.1" {
        "You are connecting through localhost. To see a real address, connect via the machine's LAN address or deploy the service."
    } else {
        "Real client address detected"
    };

    Json(json!({
        "success": true,
        "message": "IP debug completed",
        "ipInfo": {
            "frameworkIp": client.framework_ip.map(|ip| ip.to_string()),
            "realIp": client.ip,
            "publicIp": public_ip,
            "isLocalhost": client.is_localhost(),
            "headers": {
                X_FORWARDED_FOR: header_value(&headers, X_FORWARDED_FOR),
                X_REAL_IP: header_value(&headers, X_REAL_IP),
                CF_CONNECTING_IP: header_value(&headers, CF_CONNECTING_IP),
                X_CLIENT_IP: header_value(&headers, X_CLIENT_IP),
                "user-agent": client.user_agent,
            },
            "connection": {
                "remoteAddress": client.peer.map(|addr| addr.ip().to_string()),
                "socketAddress": client.peer.map(|addr| addr.to_string()),
            },
        },
        "explanation": {
            "whyLocalhost": why_localhost,
            "solutions": [
                "1. Connect via your machine's LAN address (e.g. 192.168.x.x:3000)",
                "2. Use a public tunnel such as 'npx ngrok http 3000'",
                "3. Deploy the service",
                "4. Put a reverse proxy (Nginx, Apache) in front of it",
            ],
        },
        "timestamp": now_iso(),
    }))
}

/// `GET /api/test-connection`
pub async fn test_connection(State(state): SharedState) -> Result<Json<Value>, ApiError> {
    let connection = state.diagnostics.test_connection().await?;
    let api_info = state.diagnostics.api_info().await?;
    info!(status = ?connection.status, latency_ms = connection.latency_ms, "connectivity test");

    Ok(Json(json!({
        "success": true,
        "message": "Connectivity test completed",
        "connection": connection,
        "apiInfo": api_info,
        "timestamp": now_iso(),
    })))
}

/// `GET /health`
pub async fn health(State(state): SharedState) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "verifier": state.verifier.name(),
        "timestamp": now_iso(),
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): SharedState) -> Result<Response, ApiError> {
    let text = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let req: CheckoutRequest = parse_body(&Bytes::new()).unwrap();
        assert_eq!(req.amount, json!(100));
        assert_eq!(req.product, json!("Produto Demo"));

        let req: LoginRequest = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(req.username, json!("demo@example.com"));
    }

    #[test]
    fn partial_body_keeps_other_defaults() {
        let req: TransferRequest = parse_body(&Bytes::from_static(br#"{"amount": 5}"#)).unwrap();
        assert_eq!(req.amount, json!(5));
        assert_eq!(req.recipient, json!("Conta Demo"));
    }

    #[test]
    fn explicit_null_is_kept() {
        let req: PurchaseRequest = parse_body(&Bytes::from_static(br#"{"credits": null}"#)).unwrap();
        assert_eq!(req.credits, Value::Null);
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = parse_body::<CheckoutRequest>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
    }

    #[test]
    fn object_len_ignores_non_objects() {
        let v = json!({"device": {"a": 1, "b": 2}, "behavior": "x"});
        assert_eq!(object_len(&v, "device"), 2);
        assert_eq!(object_len(&v, "behavior"), 0);
        assert_eq!(object_len(&v, "network"), 0);
    }
}
