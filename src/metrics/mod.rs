//! Metrics collection and exposition for Prometheus.
//!
//! This module provides centralized metrics recording for refresh exchanges
//! and Session Gate decisions.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
