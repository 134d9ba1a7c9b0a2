use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use validator::Validate;

use crate::error::ClientError;
use crate::htmx;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {}

#[derive(Template)]
#[template(path = "registered.html")]
pub struct RegisteredTemplate {}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 11, message = "Password must be at least 11 characters"))]
    pub password: String,
}

/// First human-readable message out of a set of field errors.
fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .into_values()
        .flatten()
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check the form and try again".to_string())
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {}
}

pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {}
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<LoginRequest>,
) -> Response {
    // Malformed input gets the same answer as a wrong password.
    if payload.validate().is_err() {
        return ClientError::InvalidCredentials.into_response();
    }
    let password = Secret::new(payload.password);

    let result = state
        .auth_client
        .authenticate_user(&payload.email, password.expose_secret())
        .await;

    let (details, refresh_cookie) = match result {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error_kind = e.kind(), "Login failed");
            return e.into_response();
        }
    };

    match state.cookies.issue(&details, &refresh_cookie) {
        Ok(issued) => {
            tracing::info!(
                account_id = %details.account_id,
                account_type = %details.account_type,
                "User logged in successfully"
            );
            htmx::client_redirect("/dashboard", issued.apply(jar))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode session cookies after login");
            e.into_response()
        }
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return ClientError::Validation(first_message(&errors)).into_response();
    }
    let password = Secret::new(payload.password);

    match state
        .auth_client
        .register_user(&payload.email, password.expose_secret())
        .await
    {
        Ok(()) => {
            tracing::info!("Account registered");
            (StatusCode::OK, RegisteredTemplate {}).into_response()
        }
        Err(e) => {
            tracing::warn!(error_kind = e.kind(), "Registration failed");
            e.into_response()
        }
    }
}

/// Clear the session cookie set. Safe to call without a session.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    tracing::info!("User logged out");
    htmx::redirect(&headers, "/login", state.cookies.clear().apply(jar))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn short_passwords_are_rejected_with_message() {
        let errors = register("a@example.com", "short").validate().unwrap_err();
        assert_eq!(first_message(&errors), "Password must be at least 11 characters");
    }

    #[test]
    fn bad_email_is_rejected_with_message() {
        let errors = register("not-an-email", "long-enough-password")
            .validate()
            .unwrap_err();
        assert_eq!(first_message(&errors), "Please enter a valid email address");
    }

    #[test]
    fn login_requires_a_password() {
        let request = LoginRequest {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn login_page_posts_via_htmx() {
        let html = LoginTemplate {}.render().unwrap();
        assert!(html.contains("hx-post='/login'"));
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register("a@example.com", "long-enough-password")
            .validate()
            .is_ok());
    }
}
