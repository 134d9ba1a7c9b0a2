//! htmx request and redirect helpers.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

pub const HX_REQUEST: &str = "hx-request";
pub const HX_REDIRECT: &str = "hx-redirect";

pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.contains_key(HX_REQUEST)
}

/// Redirect to `to`, carrying any cookie changes in `jar`.
///
/// htmx requests get `200` with `HX-Redirect` so the client navigates
/// itself; full page requests get a `303`.
pub fn redirect(headers: &HeaderMap, to: &'static str, jar: CookieJar) -> Response {
    if is_htmx_request(headers) {
        client_redirect(to, jar)
    } else {
        (jar, Redirect::to(to)).into_response()
    }
}

/// `200` with `HX-Redirect`, whatever kind of request this was.
pub fn client_redirect(to: &'static str, jar: CookieJar) -> Response {
    (jar, [(HX_REDIRECT, to)], StatusCode::OK).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, HeaderValue};

    #[test]
    fn full_page_requests_get_see_other() {
        let response = redirect(&HeaderMap::new(), "/login", CookieJar::new());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
        assert!(response.headers().get(HX_REDIRECT).is_none());
    }

    #[test]
    fn htmx_requests_get_header_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));

        let response = redirect(&headers, "/login", CookieJar::new());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[HX_REDIRECT], "/login");
        assert!(response.headers().get(LOCATION).is_none());
    }
}
