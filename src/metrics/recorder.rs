//! Metrics recording implementation using Prometheus.

use prometheus::{
    CounterVec, Encoder, Opts, Registry, TextEncoder, register_counter_vec_with_registry,
};
use std::sync::Arc;

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one refresh exchange with its outcome ("success" or "failure").
    fn record_refresh(&self, result: &str);

    /// Records how many waiters were released by an exchange.
    fn record_waiters_released(&self, result: &str, count: usize);

    /// Records a Session Gate decision.
    fn record_gate_decision(&self, decision: &str);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Refresh metrics
    refresh_exchanges_total: CounterVec,
    refresh_waiters_total: CounterVec,

    // Gate metrics
    gate_decisions_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance with a Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let refresh_exchanges_total = register_counter_vec_with_registry!(
            Opts::new(
                "refresh_exchanges_total",
                "Total number of session refresh exchanges"
            ),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register refresh_exchanges_total");

        let refresh_waiters_total = register_counter_vec_with_registry!(
            Opts::new(
                "refresh_waiters_total",
                "Requests that waited on another request's refresh exchange"
            ),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register refresh_waiters_total");

        let gate_decisions_total = register_counter_vec_with_registry!(
            Opts::new("gate_decisions_total", "Session Gate decisions"),
            &["decision"],
            registry.clone()
        )
        .expect("Failed to register gate_decisions_total");

        Metrics {
            registry,
            refresh_exchanges_total,
            refresh_waiters_total,
            gate_decisions_total,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_refresh(&self, result: &str) {
        self.refresh_exchanges_total
            .with_label_values(&[result])
            .inc();
    }

    fn record_waiters_released(&self, result: &str, count: usize) {
        self.refresh_waiters_total
            .with_label_values(&[result])
            .inc_by(count as f64);
    }

    fn record_gate_decision(&self, decision: &str) {
        self.gate_decisions_total
            .with_label_values(&[decision])
            .inc();
    }
}
