//! HTTP route definitions and handlers.
//!
//! Health and metrics endpoints are served locally. Every other path is a
//! page: it goes through the Session Gate and, when allowed, to the page
//! renderer.

mod health_routes;
mod metrics;
pub mod pages;

use crate::gate::session_gate;
use crate::state::AppState;
use axum::{Router, middleware};

/// Creates the application router with all configured routes.
///
/// The gate wraps the whole router so it sees every request before any
/// handler runs.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes::routes())
        .merge(metrics::routes())
        .fallback(pages::render)
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state)
}
