//! Prometheus-exported counters for the proxy hot path.

use metrics::{counter, histogram};
use std::time::Instant;

/// Count one inbound request by resource kind and response status.
pub fn record_request(kind: &'static str, status: u16) {
    counter!(
        "segue_requests_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Count one failed origin fetch.
pub fn record_origin_error() {
    counter!("segue_origin_errors_total").increment(1);
}

/// Record time-to-first-byte for a proxied request.
pub fn record_duration(kind: &'static str, start: Instant) {
    histogram!("segue_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; the tests pin down that
    // the helpers never panic when called outside a server context.
    #[test]
    fn recording_without_recorder_is_a_noop() {
        record_request("manifest", 200);
        record_origin_error();
        record_duration("static", Instant::now());
    }
}
