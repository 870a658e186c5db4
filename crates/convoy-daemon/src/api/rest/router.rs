//! API router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Daemon health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Inventory manages the list of instances
        .route("/inventory/instances", get(handlers::list_instances))
        .route(
            "/inventory/instances/register",
            post(handlers::register_instance),
        )
        .route("/inventory/instances/:id", patch(handlers::update_instance))
        // Deployment process; single-flight, so no ids in the paths
        .route("/deploy/", post(handlers::trigger_deployment))
        .route("/deploy/status", get(handlers::deployment_status))
        .route("/deploy/progress", post(handlers::progress_deployment))
        .route("/deploy/rollback", post(handlers::trigger_rollback))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
