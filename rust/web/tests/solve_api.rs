//! HTTP surface, end to end through warp's test client.
#![cfg(unix)]

mod support;

use serde_json::{json, Value};
use serial_test::serial;
use solvegate_web::{
    AppContext, EngineInvoker, EngineLocator, MetricsCollector, RequestValidator, ServerConfig,
    SolveService, WebServer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use support::{process_alive, MockEngine};
use warp::http::StatusCode;

fn context_with_candidates(candidates: Vec<PathBuf>, budget: Duration) -> AppContext {
    let service = SolveService::new(
        RequestValidator::new(Duration::from_secs(30)),
        Arc::new(EngineLocator::new(candidates)),
        EngineInvoker::new(budget),
        MetricsCollector::new(),
    );
    AppContext::with_service(ServerConfig::for_tests(), service)
}

fn context_for(engine: &MockEngine) -> AppContext {
    context_with_candidates(vec![engine.path.clone()], Duration::from_secs(10))
}

async fn post_solve(ctx: &AppContext, body: Value) -> (StatusCode, Value) {
    let response = warp::test::request()
        .method("POST")
        .path("/solve")
        .json(&body)
        .reply(&WebServer::routes(ctx))
        .await;
    let status = response.status();
    let body = serde_json::from_slice(response.body()).expect("json body");
    (status, body)
}

async fn get(ctx: &AppContext, path: &str) -> (StatusCode, Value) {
    let response = warp::test::request()
        .method("GET")
        .path(path)
        .reply(&WebServer::routes(ctx))
        .await;
    let status = response.status();
    let body = serde_json::from_slice(response.body()).expect("json body");
    (status, body)
}

fn canonical_request() -> Value {
    json!({
        "board": "Qs,Jh,2h",
        "oop_range": "AA,KK",
        "ip_range": "AKs,AKo",
        "pot_size": 10,
        "effective_stack": 95,
        "position": "oop"
    })
}

#[tokio::test]
#[serial]
async fn solve_returns_decision_nodes() {
    let engine = MockEngine::sample_tree();
    let ctx = context_for(&engine);

    let (status, body) = post_solve(&ctx, canonical_request()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);

    let nodes = body["strategy"]["nodes"].as_object().expect("nodes");
    assert!(!nodes.is_empty());
    let root = &nodes["root"];
    assert_eq!(root["player"], 1);
    assert_eq!(root["actions"]["CHECK"], 0.5);
    assert!(nodes.contains_key("root:CHECK"));
    assert!(body["computation_time"].as_f64().is_some());

    let snapshot = ctx.metrics().snapshot();
    assert_eq!(snapshot.solves_succeeded, 1);
    assert_eq!(snapshot.in_flight, 0);
}

#[tokio::test]
#[serial]
async fn garbage_output_is_a_bad_gateway() {
    let engine = MockEngine::with_script("echo 'Segmentation fault? no, just noise'");
    let ctx = context_for(&engine);

    let (status, body) = post_solve(&ctx, canonical_request()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["error"], "engine_output_unreadable");
    assert_eq!(ctx.metrics().snapshot().parse_failures, 1);
}

#[tokio::test]
#[serial]
async fn engine_crash_is_a_server_error_without_stderr() {
    let engine = MockEngine::with_script("echo 'internal: /home/ci/solver.cpp:42' >&2\nexit 1");
    let ctx = context_for(&engine);

    let (status, body) = post_solve(&ctx, canonical_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["error"], "engine_failed");
    assert!(!body.to_string().contains("solver.cpp"));
}

#[tokio::test]
#[serial]
async fn slow_engine_is_a_gateway_timeout_and_is_killed() {
    let engine = MockEngine::hanging();
    let ctx = context_for(&engine);
    let mut request = canonical_request();
    request["timeout_secs"] = json!(1);

    let (status, body) = post_solve(&ctx, request).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["error"], "engine_timeout");
    assert!(!process_alive(engine.recorded_pid()));
}

#[tokio::test]
async fn overlapping_range_is_rejected_before_any_engine_runs() {
    let ctx = context_with_candidates(vec![], Duration::from_secs(10));
    let body = json!({"board": "Kh,7s,2d", "oop_range": "AA,KhKs", "ip_range": "QQ"});

    let (status, body) = post_solve(&ctx, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["error"], "validation_error");
    assert_eq!(body["error"]["details"]["field"], "oop_range");
}

#[tokio::test]
async fn missing_engine_is_service_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context_with_candidates(
        vec![dir.path().join("TexasSolverConsole")],
        Duration::from_secs(10),
    );

    let (status, body) = post_solve(&ctx, canonical_request()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["error"], "engine_not_found");
    assert!(!body.to_string().contains(&*dir.path().to_string_lossy()));
}

#[tokio::test]
async fn undecodable_body_is_invalid_body() {
    let ctx = context_with_candidates(vec![], Duration::from_secs(10));
    let response = warp::test::request()
        .method("POST")
        .path("/solve")
        .header("content-type", "application/json")
        .body("{\"board\": ")
        .reply(&WebServer::routes(&ctx))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"]["error"], "invalid_body");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let ctx = context_with_candidates(vec![], Duration::from_secs(10));
    let huge = json!({"board": "Qs,Jh,2h", "oop_range": "AA".repeat(40_000), "ip_range": "KK"});
    let (status, body) = post_solve(&ctx, huge).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["error"], "payload_too_large");
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let ctx = context_with_candidates(vec![], Duration::from_secs(10));
    let (status, body) = get(&ctx, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["error"], "not_found");
}

#[tokio::test]
async fn health_reports_cache_without_resolving() {
    let engine = MockEngine::sample_tree();
    let ctx = context_for(&engine);

    let (status, body) = get(&ctx, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["engine_resolved"], false);
    assert!(ctx.locator().cached().is_none());

    ctx.locator().resolve().expect("resolve");
    let (status, body) = get(&ctx, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["engine_path"], &*engine.path.to_string_lossy());
}

#[tokio::test]
async fn reresolve_picks_up_a_newly_installed_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("TexasSolverConsole");
    let ctx = context_with_candidates(vec![target.clone()], Duration::from_secs(10));
    let routes = WebServer::routes(&ctx);

    let response = warp::test::request()
        .method("POST")
        .path("/engine/reresolve")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let engine = MockEngine::sample_tree();
    std::fs::copy(&engine.path, &target).expect("install engine");

    let response = warp::test::request()
        .method("POST")
        .path("/engine/reresolve")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.locator().cached(), Some(target));
}

#[tokio::test]
async fn root_banner_metrics_and_cors() {
    let ctx = context_with_candidates(vec![], Duration::from_secs(10));

    let (status, body) = get(&ctx, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = get(&ctx, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["solves_requested"], 0);

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .header("origin", "chrome-extension://abcdef")
        .reply(&WebServer::routes(&ctx))
        .await;
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
