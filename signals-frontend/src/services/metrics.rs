use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static SESSION_REFRESH_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UPSTREAM_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Register all collectors. Safe to call more than once; later calls are
/// ignored.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let refresh_total = IntCounterVec::new(
        Opts::new(
            "session_refresh_total",
            "Upstream access token refresh calls by outcome",
        ),
        &["outcome"],
    )?;
    let upstream_duration = HistogramVec::new(
        HistogramOpts::new(
            "upstream_request_duration_seconds",
            "Signals API call duration in seconds",
        ),
        &["operation"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(refresh_total.clone()))?;
    registry.register(Box::new(upstream_duration.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = SESSION_REFRESH_TOTAL.set(refresh_total);
    let _ = UPSTREAM_REQUEST_DURATION_SECONDS.set(upstream_duration);

    Ok(())
}

pub fn record_http_request(method: &str, path: &str, status: &str, seconds: f64) {
    let labels = [method, path, status];
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&labels).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&labels).observe(seconds);
    }
}

pub fn record_refresh(outcome: &str) {
    if let Some(counter) = SESSION_REFRESH_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_upstream_call(operation: &str, seconds: f64) {
    if let Some(histogram) = UPSTREAM_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&[operation]).observe(seconds);
    }
}

pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
