use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::context::AuthContext;
use crate::models::{SearchParams, SearchSignal};
use crate::AppState;

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate<'a> {
    pub signals: &'a [SearchSignal],
}

/// Search signals on an ISN the account has access to.
///
/// The permission check runs against the request snapshot before any
/// upstream call is made.
pub async fn search_handler(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<SearchParams>,
) -> Response {
    let perm = match auth.require_signal_type(
        &params.isn_slug,
        &params.signal_type_slug,
        &params.sem_ver,
    ) {
        Ok(perm) => perm,
        Err(e) => {
            tracing::info!(
                account_id = %auth.account().account_id,
                isn_slug = %params.isn_slug,
                "Signal search rejected locally"
            );
            return e.into_response();
        }
    };

    match state
        .auth_client
        .search_signals(auth.access_token(), perm.visibility, &params)
        .await
    {
        Ok(signals) => SearchResultsTemplate { signals: &signals }.into_response(),
        Err(e) => {
            tracing::error!(
                isn_slug = %params.isn_slug,
                error_kind = e.kind(),
                "Signal search failed"
            );
            e.into_response()
        }
    }
}
