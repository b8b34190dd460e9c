//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_pool_requests_total` (counter): calls by client, method
//! - `client_pool_request_duration_seconds` (histogram): call latency
//! - `client_pool_request_errors_total` (counter): failed calls by client, method
//!
//! # Design Decisions
//! - The collector owns its recorder; nothing is installed globally, so several
//!   pools (or test runs) never fight over registration
//! - Rendered in the Prometheus text format on demand

use metrics::{Label, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::fmt;
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "client_pool_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "client_pool_request_duration_seconds";
pub const REQUEST_ERRORS_TOTAL: &str = "client_pool_request_errors_total";

/// Explicitly constructed metrics sink for pooled calls.
pub struct MetricsCollector {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            metrics::describe_counter!(REQUESTS_TOTAL, Unit::Count, "Total number of pooled calls");
            metrics::describe_histogram!(REQUEST_DURATION_SECONDS, Unit::Seconds, "Pooled call duration");
            metrics::describe_counter!(REQUEST_ERRORS_TOTAL, Unit::Count, "Total number of failed pooled calls");
        });

        Self { recorder, handle }
    }

    /// Count a call as started.
    pub fn record_call(&self, client: &str, method: Option<&str>) {
        let labels = labels(client, method);
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(REQUESTS_TOTAL, labels).increment(1);
        });
    }

    /// Record duration and, for failures, the error counter.
    pub fn record_outcome(&self, client: &str, method: Option<&str>, elapsed: Duration, failed: bool) {
        let labels = labels(client, method);
        metrics::with_local_recorder(&self.recorder, || {
            metrics::histogram!(REQUEST_DURATION_SECONDS, labels.clone()).record(elapsed.as_secs_f64());
            if failed {
                metrics::counter!(REQUEST_ERRORS_TOTAL, labels).increment(1);
            }
        });
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsCollector").finish_non_exhaustive()
    }
}

fn labels(client: &str, method: Option<&str>) -> Vec<Label> {
    let mut labels = vec![Label::new("client", client.to_string())];
    if let Some(method) = method {
        labels.push(Label::new("method", method.to_string()));
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collectors_are_independent() {
        let a = MetricsCollector::new();
        let b = MetricsCollector::new();

        a.record_call("c1", Some("get_slot"));
        a.record_outcome("c1", Some("get_slot"), Duration::from_millis(3), true);

        let rendered = a.render();
        assert!(rendered.contains(REQUESTS_TOTAL));
        assert!(rendered.contains(REQUEST_ERRORS_TOTAL));
        assert!(rendered.contains("client=\"c1\""));
        assert!(rendered.contains("method=\"get_slot\""));

        assert!(!b.render().contains("client=\"c1\""));
    }
}
