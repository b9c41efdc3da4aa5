//! Router behaviour against a scripted verifier.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use fraudgate_api::{router, ApiMetrics, AppState, FrameworkAddr};
use fraudgate_nullables::NullVerifier;
use fraudgate_types::{VerificationMode, VerificationResult, VerificationStatus};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app_with(verifier: Arc<NullVerifier>, enable_metrics: bool) -> Router {
    let metrics = Arc::new(ApiMetrics::new().unwrap());
    router(Arc::new(AppState::new(verifier, metrics)), enable_metrics)
}

fn scripted(status: VerificationStatus, score: f64) -> (Router, Arc<NullVerifier>) {
    let verifier = Arc::new(NullVerifier::with(status, score));
    (app_with(verifier.clone(), true), verifier)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verify_ip_deny_is_forbidden() {
    let (app, _) = scripted(VerificationStatus::Deny, 95.0);
    let (status, body) = send(app, get("/api/verify-ip")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["verification"]["status"], "DENY");
    assert_eq!(body["verification"]["riskScore"].as_f64(), Some(95.0));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn verify_ip_review_is_accepted_and_allow_is_ok() {
    let (app, _) = scripted(VerificationStatus::Review, 50.0);
    let (status, body) = send(app, get("/api/verify-ip")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);

    let (app, _) = scripted(VerificationStatus::Allow, 5.0);
    let (status, body) = send(app, get("/api/verify-ip")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn verify_ip_uses_first_forwarded_address() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 5.0);
    let req = Request::get("/api/verify-ip")
        .header("x-forwarded-for", "1.2.3.4, 5.6.6.7")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app, req).await;

    assert_eq!(body["detectedIps"]["realIp"], "1.2.3.4");
    assert_eq!(body["detectedIps"]["isLocalhost"], false);
    let ctx = verifier.last_context().unwrap();
    assert_eq!(ctx.ip, "1.2.3.4");
    assert_eq!(ctx.mode, VerificationMode::IpOnly);
    assert_eq!(ctx.forwarded.x_forwarded_for.as_deref(), Some("1.2.3.4, 5.6.6.7"));
}

#[tokio::test]
async fn peer_address_used_when_no_headers() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 5.0);
    let mut req = get("/api/verify-ip");
    let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    let (_, body) = send(app, req).await;

    assert_eq!(body["detectedIps"]["realIp"], "127.0.0.1");
    assert_eq!(body["detectedIps"]["frameworkIp"], "127.0.0.1");
    assert_eq!(body["detectedIps"]["isLocalhost"], true);
    assert_eq!(verifier.last_context().unwrap().ip, "127.0.0.1");
}

#[tokio::test]
async fn framework_address_is_last_resort() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 5.0);
    let mut req = get("/api/verify-ip");
    req.extensions_mut()
        .insert(FrameworkAddr("192.168.1.20".parse().unwrap()));
    let (_, body) = send(app, req).await;

    assert_eq!(body["detectedIps"]["realIp"], "192.168.1.20");
    assert_eq!(verifier.last_context().unwrap().ip, "192.168.1.20");
}

#[tokio::test]
async fn demo_deny_is_forbidden_with_no_cache_headers() {
    let (app, verifier) = scripted(VerificationStatus::Deny, 95.0);
    let response = app.oneshot(get("/api/demo")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        verifier.last_context().unwrap().mode,
        VerificationMode::advanced("/api/demo", Some("demo-user"))
    );
}

#[tokio::test]
async fn demo_allow_still_sends_no_cache() {
    let (app, _) = scripted(VerificationStatus::Allow, 10.0);
    let req = Request::get("/api/demo")
        .header(header::USER_AGENT, "test-agent")
        .header(header::ACCEPT_LANGUAGE, "pt-BR")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::PRAGMA], "no-cache");
    let body = json_body(response).await;
    assert_eq!(body["requestInfo"]["userAgent"], "test-agent");
    assert_eq!(body["requestInfo"]["language"], "pt-BR");
}

#[tokio::test]
async fn demo_review_is_accepted_with_no_cache_headers() {
    let (app, _) = scripted(VerificationStatus::Review, 55.0);
    let response = app.oneshot(get("/api/demo")).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["verification"]["status"], "REVIEW");
}

#[tokio::test]
async fn gate_follows_verdict_changes_between_requests() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 5.0);
    let (status, _) = send(app.clone(), get("/api/verify-ip")).await;
    assert_eq!(status, StatusCode::OK);

    verifier.set_result(VerificationResult::new(VerificationStatus::Deny, 99.0));
    let (status, body) = send(app, get("/api/verify-ip")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["verification"]["riskScore"].as_f64(), Some(99.0));
    assert_eq!(verifier.contexts().len(), 2);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_allow_confirms_order_with_defaults() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 50.0);
    let (status, body) = send(app, post("/api/ecommerce", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["orderId"].as_str().unwrap().starts_with("ORD_"));
    assert_eq!(body["amount"], 100);
    assert_eq!(body["product"], "Produto Demo");
    assert_eq!(
        verifier.last_context().unwrap().mode,
        VerificationMode::advanced("/api/ecommerce", None)
    );
}

#[tokio::test]
async fn checkout_high_score_needs_auth() {
    let (app, _) = scripted(VerificationStatus::Review, 75.0);
    let (status, body) = send(app, post("/api/ecommerce", json!({"amount": 10}))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], false);
    assert_eq!(body["requiresAuth"], true);
    assert!(body.get("orderId").is_none());
}

#[tokio::test]
async fn checkout_deny_is_blocked_with_reasons() {
    let verifier = Arc::new(NullVerifier::returning(
        VerificationResult::new(VerificationStatus::Deny, 20.0).with_reasons(["tor exit node"]),
    ));
    let app = app_with(verifier, true);
    let (status, body) = send(app, post("/api/ecommerce", json!({}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reasons"], json!(["tor exit node"]));
}

#[tokio::test]
async fn banking_deny_high_score_is_held_but_not_refused() {
    let (app, _) = scripted(VerificationStatus::Deny, 95.0);
    let (status, body) = send(app, post("/api/banking", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending_approval");
    assert!(body["transactionId"].as_str().unwrap().starts_with("ORD_"));
    assert_eq!(body["amount"], 1000);
    assert_eq!(body["recipient"], "Conta Demo");
}

#[tokio::test]
async fn banking_deny_low_score_goes_through() {
    let (app, _) = scripted(VerificationStatus::Deny, 40.0);
    let (status, body) = send(app, post("/api/banking", json!({"recipient": "Alice"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("status").is_none());
    assert!(body["transactionId"].is_string());
    assert_eq!(body["recipient"], "Alice");
}

#[tokio::test]
async fn gaming_score_above_sixty_warns() {
    let (app, _) = scripted(VerificationStatus::Allow, 65.0);
    let (status, body) = send(app, post("/api/gaming", json!({"credits": 500}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["requiresPhoneVerification"], true);
    assert_eq!(body["credits"], 500);
}

#[tokio::test]
async fn gaming_low_score_has_no_warning() {
    let (app, _) = scripted(VerificationStatus::Allow, 60.0);
    let (_, body) = send(app, post("/api/gaming", json!({}))).await;
    assert_eq!(body["credits"], 100);
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn login_requires_2fa_above_seventy() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 85.0);
    let (status, body) = send(app, post("/api/login", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["requires2FA"], true);
    assert_eq!(body["username"], "demo@example.com");
    assert_eq!(verifier.last_context().unwrap().mode, VerificationMode::IpOnly);
}

#[tokio::test]
async fn login_grants_token_with_risk_level() {
    let (app, _) = scripted(VerificationStatus::Allow, 10.0);
    let (_, body) = send(app, post("/api/login", json!({"username": "ana@example.com"}))).await;
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().unwrap().starts_with("TKN_"));
    assert_eq!(body["riskLevel"], "low");
    assert_eq!(body["username"], "ana@example.com");

    let (app, _) = scripted(VerificationStatus::Allow, 50.0);
    let (_, body) = send(app, post("/api/login", json!({}))).await;
    assert_eq!(body["riskLevel"], "medium");
}

#[tokio::test]
async fn scenario_accepts_empty_body() {
    let (app, _) = scripted(VerificationStatus::Allow, 5.0);
    let req = Request::post("/api/gaming").body(Body::empty()).unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credits"], 100);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 5.0);
    let req = Request::post("/api/ecommerce")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{oops"))
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(verifier.contexts().is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verifier_failure_is_server_error_with_details() {
    let verifier = Arc::new(NullVerifier::unreachable("connection refused"));
    let app = app_with(verifier, true);
    let (status, body) = send(app, get("/api/verify-ip")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body["details"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_connection_reports_verifier_status() {
    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (status, body) = send(app, get("/api/test-connection")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["connection"]["status"], "ok");

    let app = app_with(Arc::new(NullVerifier::unreachable("down")), true);
    let (status, body) = send(app, get("/api/test-connection")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"].is_string());
}

// ---------------------------------------------------------------------------
// Fingerprint intake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fingerprint_is_required() {
    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (status, body) = send(app, post("/api/fingerprint", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Fingerprint data is required");
    assert!(body["timestamp"].is_string());

    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (status, _) = send(app, post("/api/fingerprint", json!({"fingerprint": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fingerprint_is_enhanced_and_summarised() {
    let (app, verifier) = scripted(VerificationStatus::Allow, 0.0);
    let fingerprint = json!({
        "sessionId": "session_1_abc",
        "device": {"userAgent": "ua", "language": "pt-BR", "platform": "Linux"},
        "behavior": {"clicks": 3, "keystrokes": 9},
        "network": {"ip": "detected_by_server"},
    });
    let req = Request::post("/api/fingerprint")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", "8.8.4.4")
        .body(Body::from(json!({ "fingerprint": fingerprint }).to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["original"], fingerprint);
    assert_eq!(data["enhanced"]["processed"], true);
    assert_eq!(data["enhanced"]["server"]["ip"], "8.8.4.4");
    assert_eq!(data["enhanced"]["server"]["headers"]["x-real-ip"], "8.8.4.4");
    assert_eq!(data["summary"]["deviceFields"], 3);
    assert_eq!(data["summary"]["behaviorFields"], 2);
    assert_eq!(data["summary"]["networkFields"], 1);
    assert_eq!(data["summary"]["serverFields"], 4);
    assert_eq!(data["summary"]["totalFields"], 10);
    assert!(verifier.contexts().is_empty());
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ip_debug_without_lookup_reports_null_public_ip() {
    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let req = Request::get("/api/ip-debug")
        .header("x-client-ip", "4.4.4.4")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ipInfo"]["realIp"], "4.4.4.4");
    assert_eq!(body["ipInfo"]["publicIp"], Value::Null);
    assert_eq!(body["ipInfo"]["headers"]["x-client-ip"], "4.4.4.4");
    assert_eq!(body["explanation"]["solutions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn ip_debug_explains_only_ipv4_loopback() {
    let explain = |peer: &str| {
        let mut req = get("/api/ip-debug");
        let peer: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        req
    };

    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (_, body) = send(app, explain("127.0.0.1:50000")).await;
    assert_eq!(body["ipInfo"]["isLocalhost"], true);
    assert!(body["explanation"]["whyLocalhost"]
        .as_str()
        .unwrap()
        .starts_with("You are connecting through localhost"));

    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (_, body) = send(app, explain("[::1]:50000")).await;
    assert_eq!(body["ipInfo"]["realIp"], "::1");
    assert_eq!(body["ipInfo"]["isLocalhost"], true);
    assert_eq!(body["explanation"]["whyLocalhost"], "Real client address detected");
}

#[tokio::test]
async fn health_names_verifier() {
    let (app, _) = scripted(VerificationStatus::Allow, 0.0);
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["verifier"], "null-verifier");
}

#[tokio::test]
async fn metrics_count_verdicts_and_can_be_disabled() {
    let verifier = Arc::new(NullVerifier::with(VerificationStatus::Deny, 90.0));
    let metrics = Arc::new(ApiMetrics::new().unwrap());
    let state = Arc::new(AppState::new(verifier.clone(), metrics.clone()));

    let app = router(state.clone(), true);
    app.clone().oneshot(get("/api/verify-ip")).await.unwrap();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"fraudgate_verdicts_total{scenario="ip_check",status="DENY"} 1"#));
    assert!(text.contains(r#"fraudgate_blocked_total{scenario="ip_check"} 1"#));

    let app = router(state, false);
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
