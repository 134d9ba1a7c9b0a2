//! HTTP client for the signals API.
//!
//! Only the refresh coordinator calls [`AuthClient::refresh_token`]. Business
//! calls take the bearer token from the request context and never refresh
//! on their own.

use axum_extra::extract::cookie::Cookie;
use reqwest::{
    header::{HeaderMap, COOKIE, SET_COOKIE},
    Client, Method, RequestBuilder, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use std::time::Instant;

use crate::config::ApiSettings;
use crate::error::ClientError;
use crate::models::{
    admin::IsnAccountGrant, auth::Credentials, signal::SearchQuery, AccessTokenDetails,
    ErrorResponse, Permission, SearchParams, SearchSignal, UserDetails, Visibility,
};
use crate::services::metrics;
use crate::session::ACCESS_TOKEN_COOKIE;
use crate::telemetry::inject_trace_context;

const REFRESH_TOKEN_EXPIRED_CODE: &str = "refresh_token_expired";

pub struct AuthClient {
    client: Client,
    base_url: Url,
    refresh_cookie_name: String,
}

impl AuthClient {
    pub fn new(
        settings: &ApiSettings,
        refresh_cookie_name: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.url)
            .map_err(|e| ClientError::Internal(format!("invalid api.url {}: {}", settings.url, e)))?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            refresh_cookie_name: refresh_cookie_name.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `POST /api/auth/login`. Returns the token details and the refresh
    /// token cookie set by the API.
    pub async fn authenticate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AccessTokenDetails, Cookie<'static>), ClientError> {
        let request = self
            .request(Method::POST, &["api", "auth", "login"])?
            .json(&Credentials { email, password });
        let response = self.send("login", request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error(response).await;
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
                status if status.is_client_error() => ClientError::InvalidCredentials,
                status => upstream_error(status, body),
            });
        }

        let refresh_cookie = self.refresh_cookie(response.headers())?;
        let details: AccessTokenDetails = parse_json(response).await?;

        tracing::info!(account_id = %details.account_id, "Signals API login succeeded");
        Ok((details, refresh_cookie))
    }

    /// `POST /api/auth/refresh`. The API binds the refresh token to the
    /// access token it was issued with, so both are sent. The refresh token
    /// rotates: the returned cookie replaces the one passed in.
    pub async fn refresh_token(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(AccessTokenDetails, Cookie<'static>), ClientError> {
        let cookie_header = format!(
            "{}={}; {}={}",
            ACCESS_TOKEN_COOKIE, access_token, self.refresh_cookie_name, refresh_token
        );
        let request = self
            .request(Method::POST, &["api", "auth", "refresh"])?
            .bearer_auth(access_token)
            .header(COOKIE, cookie_header);
        let response = self.send("refresh", request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error(response).await;
            return Err(match (status, body) {
                (_, Some(body)) if body.error_code == REFRESH_TOKEN_EXPIRED_CODE => {
                    ClientError::RefreshTokenExpired
                }
                (StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                    ClientError::RefreshTokenInvalid
                }
                (status, body) => upstream_error(status, body),
            });
        }

        let refresh_cookie = self.refresh_cookie(response.headers())?;
        let details = parse_json(response).await?;
        Ok((details, refresh_cookie))
    }

    /// `POST /api/auth/register`.
    pub async fn register_user(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, &["api", "auth", "register"])?
            .json(&Credentials { email, password });
        let response = self.send("register", request).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = read_error(response).await;
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            status if status.is_client_error() => {
                ClientError::Validation(error_message(status, body))
            }
            status => upstream_error(status, body),
        })
    }

    /// Search signals of one type and version on an ISN. Public ISNs go to
    /// the unauthenticated endpoint.
    pub async fn search_signals(
        &self,
        access_token: &str,
        visibility: Visibility,
        params: &SearchParams,
    ) -> Result<Vec<SearchSignal>, ClientError> {
        let version = format!("v{}", params.sem_ver);
        let tail = [
            "isn",
            params.isn_slug.as_str(),
            "signal_types",
            params.signal_type_slug.as_str(),
            version.as_str(),
            "signals",
            "search",
        ];

        let request = match visibility {
            Visibility::Public => {
                let segments: Vec<&str> = ["api", "public"].into_iter().chain(tail).collect();
                self.request(Method::GET, &segments)?
            }
            Visibility::Private => {
                let segments: Vec<&str> = ["api"].into_iter().chain(tail).collect();
                self.request(Method::GET, &segments)?.bearer_auth(access_token)
            }
        };

        let request = request.query(&SearchQuery::from(params));
        let response = self.send("search_signals", request).await?;
        business_response(response).await
    }

    /// `GET /api/admin/users?email=...`.
    pub async fn lookup_user_by_email(
        &self,
        access_token: &str,
        email: &str,
    ) -> Result<UserDetails, ClientError> {
        let request = self
            .request(Method::GET, &["api", "admin", "users"])?
            .bearer_auth(access_token)
            .query(&[("email", email)]);
        let response = self.send("lookup_user", request).await?;
        business_response(response).await
    }

    /// `PUT /api/isn/{slug}/accounts/{account_id}`.
    pub async fn add_account_to_isn(
        &self,
        access_token: &str,
        isn_slug: &str,
        account_id: &str,
        permission: Permission,
    ) -> Result<(), ClientError> {
        let request = self
            .request(Method::PUT, &["api", "isn", isn_slug, "accounts", account_id])?
            .bearer_auth(access_token)
            .json(&IsnAccountGrant { permission });
        let response = self.send("add_account_to_isn", request).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(business_error(status, read_error(response).await))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Internal(format!("api.url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with W3C trace context attached.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        Ok(self
            .client
            .request(method, self.endpoint(segments)?)
            .headers(headers))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let started = Instant::now();
        let result = request.send().await;
        metrics::record_upstream_call(operation, started.elapsed().as_secs_f64());

        result.map_err(|e| {
            let err = ClientError::from(e);
            tracing::warn!(
                operation,
                error_kind = err.kind(),
                error = %err,
                "Signals API request failed"
            );
            err
        })
    }

    fn refresh_cookie(&self, headers: &HeaderMap) -> Result<Cookie<'static>, ClientError> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .find(|cookie| cookie.name() == self.refresh_cookie_name && !cookie.value().is_empty())
            .ok_or_else(|| {
                ClientError::Protocol(format!(
                    "response did not set the {} cookie",
                    self.refresh_cookie_name
                ))
            })
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await.map_err(ClientError::from)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::Protocol(format!("undecodable response body: {}", e)))
}

async fn business_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return parse_json(response).await;
    }
    Err(business_error(status, read_error(response).await))
}

/// Read the `{error_code, message}` body of a failed response, if it has one.
async fn read_error(response: Response) -> Option<ErrorResponse> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn error_message(status: StatusCode, body: Option<ErrorResponse>) -> String {
    body.map(|b| b.message).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    })
}

fn upstream_error(status: StatusCode, body: Option<ErrorResponse>) -> ClientError {
    ClientError::Upstream {
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

fn business_error(status: StatusCode, body: Option<ErrorResponse>) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ClientError::Forbidden(error_message(status, body))
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(error_message(status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
        _ => upstream_error(status, body),
    }
}
