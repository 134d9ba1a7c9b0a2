#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use axum_extra::extract::cookie::Cookie;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde_json::{json, Value};
use signals_frontend::config::{
    ApiSettings, Environment, ServerSettings, SessionSettings, Settings, TelemetrySettings,
};
use signals_frontend::models::{AccountInfo, IsnPerm, IsnPerms, Permission, Visibility};
use signals_frontend::session::codec::{encode_account_info, encode_isn_perms};
use signals_frontend::startup::build_router;
use signals_frontend::AppState;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const REFRESH_COOKIE: &str = "refresh_token";
pub const ACCOUNT_ID: &str = "acc-1";

pub struct TestApp {
    pub router: Router,
    pub api: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_timeout(2_000).await
    }

    pub async fn spawn_with_timeout(timeout_ms: u64) -> Self {
        let api = MockServer::start().await;
        let router = router_for(&api.uri(), timeout_ms);
        Self { router, api }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn settings(api_url: &str, timeout_ms: u64) -> Settings {
    Settings {
        environment: Environment::Local,
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        api: ApiSettings {
            url: api_url.to_string(),
            timeout_ms,
        },
        session: SessionSettings::default(),
        telemetry: TelemetrySettings::default(),
    }
}

pub fn router_for(api_url: &str, timeout_ms: u64) -> Router {
    let state = AppState::new(&settings(api_url, timeout_ms)).expect("Failed to build app state");
    build_router(state)
}

/// Unsigned JWT whose `exp` is `expires_in` seconds from now.
pub fn jwt(expires_in: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": ACCOUNT_ID,
        "exp": Utc::now().timestamp() + expires_in,
        "account_type": "user",
        "role": "member",
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.test-signature", header, payload)
}

pub fn perm(permission: Permission, is_admin: bool, signal_types: &[&str]) -> IsnPerm {
    IsnPerm {
        permission,
        signal_batch_id: None,
        signal_types: signal_types.iter().map(|s| s.to_string()).collect(),
        visibility: Visibility::Private,
        is_admin,
    }
}

/// `weather`: read access to temperature/v1.0.0. `maritime`: admin with write.
pub fn default_perms() -> IsnPerms {
    let mut perms = IsnPerms::new();
    perms.insert(
        "weather".to_string(),
        perm(Permission::Read, false, &["temperature/v1.0.0"]),
    );
    perms.insert(
        "maritime".to_string(),
        perm(Permission::Write, true, &["vessel-position/v2.1.0"]),
    );
    perms
}

pub fn account() -> AccountInfo {
    AccountInfo {
        account_id: ACCOUNT_ID.to_string(),
        account_type: "user".to_string(),
        role: "member".to_string(),
    }
}

/// Login or refresh response body as the signals API sends it.
pub fn token_details(access_token: &str, isn_perms: &IsnPerms) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 1800,
        "account_id": ACCOUNT_ID,
        "account_type": "user",
        "role": "member",
        "isn_perms": isn_perms,
    })
}

pub fn refresh_set_cookie(value: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=2592000",
        REFRESH_COOKIE, value
    )
}

/// `Cookie` request header carrying a full session.
pub fn session_cookie_header(access_token: &str, refresh_token: &str, perms: &IsnPerms) -> String {
    format!(
        "{}; {}={}",
        session_cookie_header_without_refresh(access_token, perms),
        REFRESH_COOKIE,
        refresh_token,
    )
}

/// Access token, permission and account cookies, but no refresh token.
pub fn session_cookie_header_without_refresh(access_token: &str, perms: &IsnPerms) -> String {
    format!(
        "access_token={}; isn_perms={}; account_info={}",
        access_token,
        encode_isn_perms(perms).unwrap(),
        encode_account_info(&account()).unwrap(),
    )
}

pub fn get(uri: &str, cookie_header: Option<&str>, htmx: bool) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookie_header {
        builder = builder.header(header::COOKIE, cookies);
    }
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie_header: Option<&str>, htmx: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookies) = cookie_header {
        builder = builder.header(header::COOKIE, cookies);
    }
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Every `Set-Cookie` on the response, decoded.
pub fn set_cookies<B>(response: &Response<B>) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            Cookie::parse_encoded(value.to_str().unwrap().to_string()).expect("valid Set-Cookie")
        })
        .collect()
}

pub fn set_cookie<B>(response: &Response<B>, name: &str) -> Option<Cookie<'static>> {
    set_cookies(response).into_iter().find(|c| c.name() == name)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
