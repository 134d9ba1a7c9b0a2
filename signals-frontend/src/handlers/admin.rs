use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::context::AuthContext;
use crate::models::Permission;
use crate::AppState;

#[derive(Template)]
#[template(path = "account_granted.html")]
pub struct AccountGrantedTemplate<'a> {
    pub email: &'a str,
    pub permission: &'static str,
    pub isn_slug: &'a str,
}

#[derive(Deserialize)]
pub struct AddAccountRequest {
    pub email: String,
    pub permission: Permission,
}

/// Grant an account access to an ISN the caller administers.
pub async fn add_account_handler(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(isn_slug): Path<String>,
    Form(payload): Form<AddAccountRequest>,
) -> Response {
    if let Err(e) = auth.require_isn_admin(&isn_slug) {
        tracing::info!(
            account_id = %auth.account().account_id,
            isn_slug = %isn_slug,
            "ISN account grant rejected locally"
        );
        return e.into_response();
    }

    let user = match state
        .auth_client
        .lookup_user_by_email(auth.access_token(), payload.email.trim())
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(isn_slug = %isn_slug, error_kind = e.kind(), "User lookup failed");
            return e.into_response();
        }
    };

    match state
        .auth_client
        .add_account_to_isn(
            auth.access_token(),
            &isn_slug,
            &user.account_id,
            payload.permission,
        )
        .await
    {
        Ok(()) => {
            tracing::info!(
                isn_slug = %isn_slug,
                granted_account_id = %user.account_id,
                permission = payload.permission.as_str(),
                "Account added to ISN"
            );
            AccountGrantedTemplate {
                email: &user.email,
                permission: payload.permission.as_str(),
                isn_slug: &isn_slug,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(isn_slug = %isn_slug, error_kind = e.kind(), "Adding account to ISN failed");
            e.into_response()
        }
    }
}
