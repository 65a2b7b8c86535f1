use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gateway_core::GatewayConfig;
use gateway_dispatch::Dispatcher;
use gateway_http::{build_router, AppState};
use gateway_store::EngineHandle;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

fn test_state() -> AppState {
    let engine = EngineHandle::open_in_memory().unwrap();
    gateway_store::bootstrap(&engine).unwrap();
    let config = GatewayConfig {
        api_key: "secret".to_string(),
        duckdb_path: std::path::PathBuf::from(":memory:"),
        bind_addr: "127.0.0.1:0".to_string(),
        dispatch_timeout_secs: 5,
    };
    AppState {
        engine,
        dispatcher: Dispatcher::new(Duration::from_secs(5)).unwrap(),
        config: Arc::new(config),
    }
}

fn test_router() -> axum::Router {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    build_router(test_state(), handle)
}

#[tokio::test]
async fn healthz_is_reachable_without_auth() {
    let app = test_router();
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_require_api_key() {
    let app = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/webhooks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_accept_the_configured_key() {
    let app = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/webhooks")
                .header("X-API-Key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ingress_for_unregistered_path_is_not_found() {
    let app = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/unknown/path")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
