//! HTTP API server (Axum)

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;

/// Assemble every route group and bind `state`, producing a runnable
/// `Router` ready for `axum::serve` or in-process testing via `oneshot`.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::context_routes())
        .merge(routes::resource_routes())
        .merge(routes::search_routes())
        .merge(routes::session_routes())
        .merge(routes::admin_routes())
        .merge(routes::register_routes())
        .merge(routes::system_routes())
        .with_state(state)
}

/// Convenience entry point for zero-config local runs and tests.
pub fn app() -> Router {
    app_with_state(AppState::new())
}
