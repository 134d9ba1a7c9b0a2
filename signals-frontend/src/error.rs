use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures surfaced by the auth client, the session codec and local
/// permission checks.
///
/// The type is `Clone` so a single refresh outcome can be handed to every
/// request waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response from signals API: {0}")]
    Protocol(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("rate limited by signals API")]
    RateLimited,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error("refresh token invalid")]
    RefreshTokenInvalid,

    #[error("session cookie could not be decoded: {0}")]
    SessionDecode(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("signals API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Refresh failures the session cannot recover from. Never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClientError::RefreshTokenExpired | ClientError::RefreshTokenInvalid
        )
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "network",
            ClientError::Timeout => "timeout",
            ClientError::Protocol(_) => "protocol",
            ClientError::InvalidCredentials => "invalid_credentials",
            ClientError::RateLimited => "rate_limited",
            ClientError::Validation(_) => "validation",
            ClientError::RefreshTokenExpired => "expired",
            ClientError::RefreshTokenInvalid => "invalid",
            ClientError::SessionDecode(_) => "session_decode",
            ClientError::Forbidden(_) => "forbidden",
            ClientError::Upstream { .. } => "upstream",
            ClientError::Internal(_) => "internal",
        }
    }

    /// Message safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Timeout => "The request timed out, please try again".to_string(),
            ClientError::Network(_) => {
                "Unable to reach the server, check your connection and try again".to_string()
            }
            ClientError::InvalidCredentials => "Invalid email or password".to_string(),
            ClientError::RateLimited => {
                "Too many attempts, please wait a moment and try again".to_string()
            }
            ClientError::Validation(message) => message.clone(),
            ClientError::Forbidden(reason) => reason.clone(),
            _ => "Something went wrong, please try again".to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ClientError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ClientError::Network(_) | ClientError::Protocol(_) | ClientError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ClientError::InvalidCredentials | ClientError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ClientError::RefreshTokenExpired
            | ClientError::RefreshTokenInvalid
            | ClientError::SessionDecode(_) => StatusCode::UNAUTHORIZED,
            ClientError::Forbidden(_) => StatusCode::FORBIDDEN,
            ClientError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ClientError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Protocol(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
}

/// Renders the error as an HTML fragment for htmx swap targets.
impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let template = ErrorTemplate {
            message: self.user_message(),
        };
        (self.status_code(), template).into_response()
    }
}
