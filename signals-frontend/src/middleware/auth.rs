use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::context::AuthContext;
use crate::htmx;
use crate::session::{classify, TokenStatus};
use crate::AppState;

/// Resolve the session for a protected route.
///
/// - Missing or invalid access token: clear the session and redirect to login.
/// - Valid: decode the cookie set into an [`AuthContext`] and continue.
/// - Expired: decode the cookie set as above, then refresh once (shared with
///   concurrent requests for the same session), rewrite the cookie set, and
///   continue with the new values. A failed refresh clears the session and
///   redirects to login.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = &state.cookies;
    let access_token = cookies.access_token(&jar);

    match classify(access_token.as_deref(), Utc::now()) {
        TokenStatus::Missing => {
            tracing::debug!(path = %request.uri().path(), "No access token, redirecting to login");
            sign_out(&state, &request, jar)
        }
        TokenStatus::Invalid => {
            tracing::warn!(path = %request.uri().path(), "Malformed access token cookie");
            sign_out(&state, &request, jar)
        }
        TokenStatus::Valid => match cookies.read(&jar) {
            Ok(session) => {
                request.extensions_mut().insert(AuthContext::from(session));
                next.run(request).await
            }
            Err(e) => {
                tracing::warn!(error_kind = e.kind(), error = %e, "Session cookies rejected");
                sign_out(&state, &request, jar)
            }
        },
        TokenStatus::Expired => {
            // A tampered cookie set is rejected before it can be refreshed.
            let session = match cookies.read(&jar) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error_kind = e.kind(), error = %e, "Session cookies rejected");
                    return sign_out(&state, &request, jar);
                }
            };
            let Some(refresh_token) = session.refresh_token.as_deref() else {
                tracing::info!("Access token expired and no refresh token present");
                return sign_out(&state, &request, jar);
            };

            let refreshed = match state
                .refresher
                .refresh(&session.access_token, refresh_token)
                .await
            {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    tracing::info!(
                        error_kind = e.kind(),
                        "Session could not be refreshed, signing out"
                    );
                    return sign_out(&state, &request, jar);
                }
            };

            let issued = match cookies.issue(&refreshed.details, &refreshed.refresh_cookie) {
                Ok(issued) => issued,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode refreshed session");
                    return sign_out(&state, &request, jar);
                }
            };

            // Handlers see the refreshed values; the request cookies are stale.
            request
                .extensions_mut()
                .insert(AuthContext::from_details(&refreshed.details));
            let response = next.run(request).await;

            (issued.apply(jar), response).into_response()
        }
    }
}

fn sign_out(state: &AppState, request: &Request, jar: CookieJar) -> Response {
    htmx::redirect(request.headers(), "/login", state.cookies.clear().apply(jar))
}
