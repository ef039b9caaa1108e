use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, AuthProvider};
use crate::handler::{self, SharedService};

/// Build the axum router with all IPAM endpoints.
///
/// Everything except `/v1/health` passes through the auth gate.
pub fn build_router(service: SharedService, auth: Arc<dyn AuthProvider>) -> Router {
    let gated = Router::new()
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/status", get(handler::status_handler))
        .route("/v1/reload", post(handler::reload_handler))
        .route(
            "/v1/prefixes",
            get(handler::list_prefixes).post(handler::create_prefix),
        )
        .route(
            "/v1/prefixes/:prefix",
            get(handler::get_prefix)
                .put(handler::update_prefix)
                .delete(handler::delete_prefix),
        )
        .route(
            "/v1/prefixes/:prefix/subnets",
            get(handler::list_subnets).post(handler::create_subnet),
        )
        .route(
            "/v1/prefixes/:prefix/subnets/:subnet",
            get(handler::get_subnet)
                .put(handler::update_subnet)
                .delete(handler::delete_subnet),
        )
        .route(
            "/v1/prefixes/:prefix/subnets/:subnet/hosts",
            get(handler::list_hosts).post(handler::create_host),
        )
        .route(
            "/v1/prefixes/:prefix/subnets/:subnet/hosts/:host",
            get(handler::get_host)
                .put(handler::update_host)
                .delete(handler::delete_host),
        )
        .route_layer(middleware::from_fn_with_state(auth, require_auth));

    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
