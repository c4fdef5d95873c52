//! HTTP router and middleware stack

use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{self, health, ready};
use crate::state::AppState;

pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // Entitlement reads
    let tenant_routes = Router::new()
        .route(
            "/tenants/{tenant_id}/permissions",
            get(handlers::get_permissions),
        )
        .route(
            "/tenants/{tenant_id}/features/{feature}",
            get(handlers::check_feature),
        )
        .route("/tenants/{tenant_id}/limits/{limit}", get(handlers::get_limit))
        .route(
            "/tenants/{tenant_id}/devices/admission",
            get(handlers::check_device_admission),
        )
        .route(
            "/tenants/{tenant_id}/cache/invalidate",
            post(handlers::invalidate_cache),
        );

    // Superadmin routes
    let admin_routes = Router::new()
        .route("/admin/subscriptions", post(handlers::create_subscription))
        .route(
            "/admin/subscriptions/{id}",
            axum::routing::patch(handlers::update_subscription),
        )
        .route(
            "/admin/subscriptions/{id}/reactivate",
            post(handlers::reactivate_subscription),
        )
        .route(
            "/admin/tenants/{tenant_id}/subscription",
            get(handlers::get_subscription),
        )
        .route(
            "/admin/tenants/{tenant_id}/overrides",
            get(handlers::list_overrides),
        )
        .route(
            "/admin/tenants/{tenant_id}/overrides/{name}",
            put(handlers::set_override).delete(handlers::remove_override),
        )
        .route(
            "/admin/tenants/{tenant_id}/audit",
            get(handlers::get_audit_log),
        );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", tenant_routes.merge(admin_routes))
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
