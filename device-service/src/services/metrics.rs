//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint handler.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// This must be called once at startup before any metrics are recorded.
/// Panics if called more than once.
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Count a store query by operation (`list`, `serial`, `recent`) and outcome.
pub fn record_device_query(operation: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        "device_queries_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record how many summaries a listing returned.
pub fn record_devices_returned(operation: &'static str, count: usize) {
    histogram!("devices_returned", "operation" => operation).record(count as f64);
}
