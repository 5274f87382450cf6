//! Prometheus metrics for the docs service.

use metrics::{counter, histogram};

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a ref resolution attempt and its outcome.
pub fn ref_resolved(outcome: &str) {
    counter!("docs_ref_resolutions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a revision state transition.
pub fn revision_status_changed(status: &str) {
    counter!("docs_revisions_total", "status" => status.to_string()).increment(1);
}

/// Record a file serve and whether the artifact was found.
pub fn file_served(result: &str) {
    counter!("docs_files_served_total", "result" => result.to_string()).increment(1);
}

/// Record documentation build duration.
pub fn build_duration(duration_ms: u64) {
    histogram!("docs_build_duration_ms").record(duration_ms as f64);
}

/// Record a CDN purge attempt.
pub fn cdn_purge(outcome: &str) {
    counter!("docs_cdn_purges_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a retry request.
pub fn retry_requested(applied: bool) {
    let outcome = if applied { "applied" } else { "noop" };
    counter!("docs_retries_total", "outcome" => outcome.to_string()).increment(1);
}
