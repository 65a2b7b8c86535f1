//! The admin surface (webhook/reference-table/UDF CRUD), the dynamic
//! webhook ingress, and the ambient `/healthz` + `/metrics` endpoints,
//! assembled into one axum `Router`.

pub mod admin;
pub mod auth;
pub mod health;
pub mod ingress;
pub mod metrics;
pub mod state;

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn build_router(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let admin_routes = Router::new()
        .route("/webhooks", post(admin::create_webhook).get(admin::list_webhooks))
        .route(
            "/webhooks/:id",
            get(admin::get_webhook).delete(admin::delete_webhook),
        )
        .route("/webhooks/:id/status", patch(admin::set_webhook_status))
        .route("/webhooks/:id/events", get(admin::webhook_history))
        .route(
            "/webhooks/:id/reference-tables",
            post(admin::create_reference_table).get(admin::list_reference_tables),
        )
        .route("/webhooks/:id/udfs", get(admin::list_udfs))
        .route("/reference-tables/:id", delete(admin::delete_reference_table))
        .route("/udfs", post(admin::create_udf))
        .route("/udfs/:id", delete(admin::delete_udf))
        .route("/query", post(admin::run_query))
        .route("/stats", get(admin::stats))
        .route("/events", get(admin::list_events))
        .route("/events/:id", get(admin::get_transformed_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    // Mounted at the root so a registered webhook's `source_path` is served
    // directly (`POST {source_path}`) rather than under an extra prefix.
    // axum's router prefers the more specific `/admin`, `/healthz` and
    // `/metrics` matches over this wildcard, so it never shadows them.
    let ingress_routes = Router::new().route("/*path", post(ingress::receive));

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::render))
        .with_state(metrics::MetricsState { handle: metrics_handle });

    Router::new()
        .route("/healthz", get(health::healthz))
        .nest("/admin", admin_routes)
        .merge(ingress_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
