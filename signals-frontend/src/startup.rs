use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin::add_account_handler,
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler, register_handler, register_page},
    dashboard::dashboard_handler,
    metrics::metrics,
    signals::search_handler,
};
use crate::middleware::{
    auth_middleware, metrics_middleware, request_id_middleware, security_headers_middleware,
    REQUEST_ID_HEADER,
};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Everything here sees the session through the auth middleware.
    let protected = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/search", get(search_handler))
        .route("/admin/isn/:isn_slug/accounts", post(add_account_handler))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/register", get(register_page).post(register_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .merge(protected)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost, so the trace span sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
