//! Shared application state.
//!
//! Contains the state that is shared across all request handlers of the
//! edge server.

use crate::config::ConfigV1;
use crate::gate::SessionGate;
use crate::metrics::Metrics;
use crate::routes::pages::PageUpstream;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Route decisions made before any page is served.
    pub gate: Arc<SessionGate>,
    pub metrics: Metrics,
    /// Page renderer that gated requests are forwarded to, if configured.
    pub upstream: Option<Arc<PageUpstream>>,
}
