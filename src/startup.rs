//! Application startup and server initialization.
//!
//! This module builds the edge server state (Session Gate, metrics, page
//! renderer) and serves the router.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::gate::SessionGate;
use crate::metrics::Metrics;
use crate::routes;
use crate::routes::pages::PageUpstream;
use crate::state::AppState;

/// Builds the shared state from a validated configuration.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, Box<dyn std::error::Error>> {
    let upstream = match &config.edge.render_upstream {
        Some(base_url) => Some(Arc::new(PageUpstream::new(
            base_url,
            Duration::from_millis(config.api.timeout_in_ms),
        )?)),
        None => None,
    };

    Ok(AppState {
        gate: Arc::new(SessionGate::new(&config.gate)),
        metrics: Metrics::new(),
        upstream,
        config,
    })
}

/// Initializes and runs the edge server.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the configured address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    match &config.edge.render_upstream {
        Some(upstream) => info!(upstream = upstream.as_str(), "Forwarding pages"),
        None => info!("No page renderer configured, pages answer 404"),
    }

    let app = routes::create_router(state);

    info!("Starting server on {}", config.edge.bind_address);
    let listener = TcpListener::bind(&config.edge.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
