//! Prometheus metrics for bucket-kv
//!
//! Defines metrics for:
//! - Request counts by route and status
//! - Request latency
//! - Storage operation counts and duration

use axum::{extract::MatchedPath, extract::Request, middleware::Next, response::Response};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

lazy_static! {
    /// Registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// HTTP request counter by route and status
    pub static ref HTTP_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("bucket_kv_http_requests_total", "Total HTTP requests"),
        &["route", "status"]
    )
    .expect("Failed to create HTTP_REQUESTS metric");

    /// HTTP request latency histogram
    pub static ref HTTP_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "bucket_kv_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(LATENCY_BUCKETS.to_vec())
    )
    .expect("Failed to create HTTP_REQUEST_DURATION metric");

    /// Storage operation counter by operation and status
    pub static ref STORAGE_OPERATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("bucket_kv_storage_operations_total", "Total storage operations"),
        &["operation", "status"]
    )
    .expect("Failed to create STORAGE_OPERATIONS metric");

    /// Storage operation duration histogram by operation
    pub static ref STORAGE_OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bucket_kv_storage_operation_duration_seconds",
            "Storage operation duration in seconds"
        )
        .buckets(LATENCY_BUCKETS.to_vec()),
        &["operation"]
    )
    .expect("Failed to create STORAGE_OPERATION_DURATION metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(HTTP_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(STORAGE_OPERATIONS.clone()))?;
    REGISTRY.register(Box::new(STORAGE_OPERATION_DURATION.clone()))?;
    Ok(())
}

/// Record the outcome of one storage call.
pub fn observe_storage(operation: &str, ok: bool, started: Instant) {
    let status = if ok { "ok" } else { "error" };
    STORAGE_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
    STORAGE_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Middleware counting requests by matched route and response status
pub async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let started = Instant::now();

    let response = next.run(request).await;

    HTTP_REQUESTS
        .with_label_values(&[route.as_str(), response.status().as_str()])
        .inc();
    HTTP_REQUEST_DURATION.observe(started.elapsed().as_secs_f64());
    response
}

/// Render the registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_storage_counts() {
        let before = STORAGE_OPERATIONS
            .with_label_values(&["unit-test", "ok"])
            .get();
        observe_storage("unit-test", true, Instant::now());
        let after = STORAGE_OPERATIONS
            .with_label_values(&["unit-test", "ok"])
            .get();
        assert_eq!(after, before + 1);
    }
}
