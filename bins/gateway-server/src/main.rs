use std::sync::Arc;

use anyhow::Context;
use gateway_core::GatewayConfig;
use gateway_dispatch::Dispatcher;
use gateway_http::AppState;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    tracing::info!(bind_addr = %config.bind_addr, duckdb_path = %config.duckdb_path.display(), "starting gateway-server");

    let engine = gateway_store::EngineHandle::open(&config.duckdb_path).context("opening engine")?;
    gateway_store::bootstrap(&engine).context("bootstrapping catalog")?;

    let dispatcher = Dispatcher::new(config.dispatch_timeout()).context("building dispatcher")?;
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let state = AppState {
        engine,
        dispatcher,
        config: Arc::new(config.clone()),
    };

    let app = gateway_http::build_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
