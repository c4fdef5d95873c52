//! Tollgate Entitlement API
//!
//! Feature-entitlement service answering "may this tenant use this feature,
//! and up to what limit".
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/tenants/{tenant_id}/permissions` - Permissions snapshot
//! - `GET /api/v1/tenants/{tenant_id}/features/{feature}` - Check one feature
//! - `GET /api/v1/tenants/{tenant_id}/limits/{limit}` - Resolve one limit
//! - `GET /api/v1/tenants/{tenant_id}/devices/admission` - Admit a new device
//! - `POST /api/v1/tenants/{tenant_id}/cache/invalidate` - Drop cached snapshot
//!
//! ## Admin Endpoints (superadmin)
//!
//! - `POST /api/v1/admin/subscriptions` - Create subscription
//! - `PATCH /api/v1/admin/subscriptions/{id}` - Update subscription
//! - `POST /api/v1/admin/subscriptions/{id}/reactivate` - Reactivate subscription
//! - `GET /api/v1/admin/tenants/{tenant_id}/subscription` - Tenant subscription
//! - `GET /api/v1/admin/tenants/{tenant_id}/overrides` - List overrides
//! - `PUT /api/v1/admin/tenants/{tenant_id}/overrides/{name}` - Set override
//! - `DELETE /api/v1/admin/tenants/{tenant_id}/overrides/{name}` - Remove override
//! - `GET /api/v1/admin/tenants/{tenant_id}/audit` - Audit log
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::shared::OPERATION_DURATION_SECONDS;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("entitlement_api=debug".parse()?)
                .add_directive("tollgate_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tollgate Entitlement API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        cache_enabled = config.cache_enabled,
        cache_ttl_secs = config.engine.cache_ttl.as_secs(),
        store_fault_policy = ?config.engine.store_fault_policy,
        "Configuration loaded"
    );

    // Tier catalog, before anything touches the network
    let catalog = config.load_catalog()?;

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = tollgate_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    tollgate_db::run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));

    // Create application state
    let state = AppState::new(pool, catalog, config);

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    run_http_server(app, http_addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_http_server(app: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Reads are cache hits most of the time; sub-millisecond buckets matter
    let read_latency_buckets = &[
        0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
    ];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(tollgate_core::metrics::RESOLUTION_DURATION_SECONDS.to_string()),
            read_latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(OPERATION_DURATION_SECONDS.to_string()),
            read_latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    tollgate_core::metrics::describe_metrics();
    metrics::describe_histogram!(
        OPERATION_DURATION_SECONDS,
        "Entitlement API handler latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
