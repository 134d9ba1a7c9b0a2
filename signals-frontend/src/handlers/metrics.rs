use axum::{
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};

use crate::services::metrics::get_metrics;

/// Prometheus scrape endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        get_metrics(),
    )
}
