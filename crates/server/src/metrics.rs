//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions for downloads, progress streams and installs
//! - Helper functions for recording metrics

use amdl_web_types::DownloadStatus;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(
        "downloads_started_total",
        "Download sessions accepted by POST /api/download"
    );
    describe_counter!(
        "downloads_finished_total",
        "Download sessions that reached a terminal status, by status"
    );
    describe_gauge!(
        "progress_streams_open",
        "Progress SSE streams currently connected"
    );
    describe_counter!(
        "dependency_installs_total",
        "Dependency install attempts, by dependency and result"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_download_started() {
    counter!("downloads_started_total").increment(1);
}

pub fn record_download_finished(status: DownloadStatus) {
    counter!("downloads_finished_total", "status" => status.as_str()).increment(1);
}

pub fn record_install(name: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("dependency_installs_total", "name" => name.to_string(), "result" => result)
        .increment(1);
}

/// Holds `progress_streams_open` up for as long as it lives.
pub struct StreamGauge(());

impl StreamGauge {
    pub fn open() -> Self {
        gauge!("progress_streams_open").increment(1.0);
        Self(())
    }
}

impl Drop for StreamGauge {
    fn drop(&mut self) {
        gauge!("progress_streams_open").decrement(1.0);
    }
}
