pub mod auth;
pub mod http_metrics;
pub mod request_id;
pub mod security_headers;

pub use auth::auth_middleware;
pub use http_metrics::metrics_middleware;
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
pub use security_headers::security_headers_middleware;
