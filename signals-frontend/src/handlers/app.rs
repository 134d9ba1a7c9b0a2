use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::session::{classify, TokenStatus};
use crate::AppState;

/// Send signed-in users to the dashboard and everyone else to login.
///
/// An expired token still counts as signed in here; the auth middleware on
/// `/dashboard` refreshes it.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let access_token = state.cookies.access_token(&jar);
    match classify(access_token.as_deref(), Utc::now()) {
        TokenStatus::Valid | TokenStatus::Expired => Redirect::to("/dashboard"),
        TokenStatus::Missing | TokenStatus::Invalid => Redirect::to("/login"),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
