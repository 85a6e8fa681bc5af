use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use http::HeaderMap;
use http::header::COOKIE;
use tracing::debug;

use super::matcher::RouteMatcher;
use crate::config::GateConfig;
use crate::metrics::MetricsRecorder;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Location of the sign-in page, carrying the original path and query.
    RedirectToSignIn(String),
    RedirectToLanding(String),
}

impl GateDecision {
    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Proceed => "proceed",
            GateDecision::RedirectToSignIn(_) => "redirect_sign_in",
            GateDecision::RedirectToLanding(_) => "redirect_landing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    matcher: RouteMatcher,
    session_cookie: String,
    protected_routes: Vec<String>,
    guest_routes: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl SessionGate {
    pub fn new(config: &GateConfig) -> Self {
        SessionGate {
            matcher: RouteMatcher::from_config(config),
            session_cookie: config.session_cookie.clone(),
            protected_routes: config.protected_routes.clone(),
            guest_routes: config.guest_routes.clone(),
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
        }
    }

    /// Pure routing decision for one page request.
    ///
    /// Protected pages without a session go to sign-in with the full
    /// original path and query in `redirect`. Guest-only pages with a
    /// session go to the landing page.
    pub fn decide(&self, path: &str, query: Option<&str>, session_present: bool) -> GateDecision {
        if !self.matcher.is_gated(path) {
            return GateDecision::Proceed;
        }

        if !session_present && starts_with_any(path, &self.protected_routes) {
            let target = match query.filter(|q| !q.is_empty()) {
                Some(query) => format!("{}?{}", path, query),
                None => path.to_string(),
            };
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", &target)
                .finish();
            return GateDecision::RedirectToSignIn(format!("{}?{}", self.login_path, encoded));
        }

        if session_present && starts_with_any(path, &self.guest_routes) {
            return GateDecision::RedirectToLanding(self.landing_path.clone());
        }

        GateDecision::Proceed
    }

    /// True when the session cookie is sent with a non-empty value.
    pub fn session_present(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name.trim() == self.session_cookie && !value.trim().is_empty())
    }
}

fn starts_with_any(path: &str, routes: &[String]) -> bool {
    routes.iter().any(|route| path.starts_with(route.as_str()))
}

/// Axum middleware running [`SessionGate::decide`] in front of every page.
pub async fn session_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let uri = request.uri();
    let present = state.gate.session_present(request.headers());
    let decision = state.gate.decide(uri.path(), uri.query(), present);
    state.metrics.record_gate_decision(decision.label());

    match decision {
        GateDecision::Proceed => next.run(request).await,
        GateDecision::RedirectToSignIn(location) | GateDecision::RedirectToLanding(location) => {
            debug!(
                path = request.uri().path(),
                location = location.as_str(),
                "session gate redirect"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}
