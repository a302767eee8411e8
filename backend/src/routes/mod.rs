//! Route definitions for the FAPECAFES report gateway

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes
        .nest("/snapshot", snapshot_routes(state.clone()))
        .nest("/reports", report_routes(state))
}

/// Snapshot status and manual refresh (protected)
fn snapshot_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_snapshot_status))
        .route("/refresh", post(handlers::refresh_snapshot))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Grouped reports and exports (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/accounting", get(handlers::get_accounting))
        .route("/:kind", get(handlers::get_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
