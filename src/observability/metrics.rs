//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lambda_proxy_invocations_total` (counter): invocations by outcome
//! - `lambda_proxy_invocation_duration_seconds` (histogram): transport latency by outcome
//! - `lambda_proxy_transport_errors_total` (counter): failed calls
//! - `lambda_proxy_rejected_total` (counter): requests refused before invoking
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, metrics disabled)
//! - Labels only take values from fixed sets. Function name and region come
//!   from client headers, so they go to the logs instead

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::invocation::{InvocationResult, TransportError};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Label describing how an invocation ended.
pub fn outcome_label(outcome: &Result<InvocationResult, TransportError>) -> &'static str {
    match outcome {
        Ok(result) if result.function_error.is_some() => "function_error",
        Ok(_) => "ok",
        Err(_) => "transport_error",
    }
}

pub fn record_invocation(outcome: &'static str, start: Instant) {
    counter!("lambda_proxy_invocations_total", "outcome" => outcome).increment(1);
    histogram!("lambda_proxy_invocation_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());

    if outcome == "transport_error" {
        counter!("lambda_proxy_transport_errors_total").increment(1);
    }
}

pub fn record_rejected(reason: &'static str) {
    counter!("lambda_proxy_rejected_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome_label(&Ok(InvocationResult::ok("{}"))), "ok");

        let mut failed = InvocationResult::ok("{}");
        failed.function_error = Some("Unhandled".into());
        assert_eq!(outcome_label(&Ok(failed)), "function_error");

        assert_eq!(outcome_label(&Err(TransportError::new("down"))), "transport_error");
    }

    #[test]
    fn invocation_series_are_labelled_by_outcome_only() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_invocation("ok", Instant::now());
            record_invocation("transport_error", Instant::now());
        });
        let rendered = handle.render();

        assert!(rendered.contains(r#"lambda_proxy_invocations_total{outcome="ok"} 1"#));
        assert!(rendered.contains(r#"lambda_proxy_invocations_total{outcome="transport_error"} 1"#));
        assert!(rendered.contains("lambda_proxy_transport_errors_total 1"));
        assert!(!rendered.contains("function="));
        assert!(!rendered.contains("region="));
    }
}
