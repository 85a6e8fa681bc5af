//! The Session Gate: decides, before a page is served, whether the visitor
//! may see it, must sign in first, or is already signed in and belongs on
//! the landing page.
//!
//! The only session signal available here is whether the session cookie is
//! present. Its value is never inspected or verified.

pub mod matcher;
pub mod session_gate;

pub use matcher::RouteMatcher;
pub use session_gate::{GateDecision, SessionGate, session_gate};
