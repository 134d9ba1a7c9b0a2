//! Per-request authorization snapshot.
//!
//! The auth middleware resolves the session once per request and inserts an
//! [`AuthContext`] into the request extensions. Handlers read identity and
//! permissions from it and never parse session cookies themselves: after a
//! refresh the request cookies are stale, while the snapshot holds the new
//! values.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::error::ClientError;
use crate::models::{AccessTokenDetails, AccountInfo, IsnPerm, IsnPerms};
use crate::session::StoredSession;

#[derive(Debug)]
struct Snapshot {
    access_token: String,
    account: AccountInfo,
    isn_perms: IsnPerms,
}

/// Immutable view of the session for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    inner: Arc<Snapshot>,
}

impl AuthContext {
    pub fn new(access_token: impl Into<String>, account: AccountInfo, isn_perms: IsnPerms) -> Self {
        Self {
            inner: Arc::new(Snapshot {
                access_token: access_token.into(),
                account,
                isn_perms,
            }),
        }
    }

    pub fn from_details(details: &AccessTokenDetails) -> Self {
        Self::new(
            details.access_token.clone(),
            details.account_info(),
            details.isn_perms.clone(),
        )
    }

    pub fn access_token(&self) -> &str {
        &self.inner.access_token
    }

    pub fn account(&self) -> &AccountInfo {
        &self.inner.account
    }

    pub fn isn_perms(&self) -> &IsnPerms {
        &self.inner.isn_perms
    }

    pub fn isn_perm(&self, isn_slug: &str) -> Option<&IsnPerm> {
        self.inner.isn_perms.get(isn_slug)
    }

    /// Permission record for `isn_slug`, or `Forbidden` when the account has
    /// no access to that ISN.
    pub fn require_isn_access(&self, isn_slug: &str) -> Result<&IsnPerm, ClientError> {
        self.isn_perm(isn_slug)
            .ok_or_else(|| ClientError::Forbidden("You have no permission for this network".into()))
    }

    pub fn require_signal_type(
        &self,
        isn_slug: &str,
        signal_type_slug: &str,
        sem_ver: &str,
    ) -> Result<&IsnPerm, ClientError> {
        let perm = self.require_isn_access(isn_slug)?;
        if !perm.allows_signal_type(signal_type_slug, sem_ver) {
            return Err(ClientError::Forbidden(
                "You have no permission for this signal type".into(),
            ));
        }
        Ok(perm)
    }

    pub fn require_isn_admin(&self, isn_slug: &str) -> Result<&IsnPerm, ClientError> {
        let perm = self.require_isn_access(isn_slug)?;
        if !perm.is_admin {
            return Err(ClientError::Forbidden(
                "You need admin rights on this network".into(),
            ));
        }
        Ok(perm)
    }
}

impl From<StoredSession> for AuthContext {
    fn from(session: StoredSession) -> Self {
        Self::new(session.access_token, session.account, session.isn_perms)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes behind the auth middleware.
        parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "Auth context missing from request extensions");
            Redirect::to("/login").into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Permission, Visibility};

    fn context() -> AuthContext {
        let mut perms = IsnPerms::new();
        perms.insert(
            "weather".into(),
            IsnPerm {
                permission: Permission::Read,
                signal_batch_id: None,
                signal_types: vec!["temperature/v1.0.0".into()],
                visibility: Visibility::Private,
                is_admin: false,
            },
        );
        perms.insert(
            "maritime".into(),
            IsnPerm {
                permission: Permission::Write,
                signal_batch_id: Some("batch-9".into()),
                signal_types: vec![],
                visibility: Visibility::Public,
                is_admin: true,
            },
        );

        AuthContext::new(
            "h.p.s",
            AccountInfo {
                account_id: "acc-1".into(),
                account_type: "user".into(),
                role: "member".into(),
            },
            perms,
        )
    }

    #[test]
    fn absent_isn_means_no_access() {
        let err = context().require_isn_access("unknown").unwrap_err();
        assert_eq!(
            err,
            ClientError::Forbidden("You have no permission for this network".into())
        );
    }

    #[test]
    fn signal_type_must_be_listed() {
        let ctx = context();
        assert!(ctx.require_signal_type("weather", "temperature", "1.0.0").is_ok());
        assert!(matches!(
            ctx.require_signal_type("weather", "pressure", "1.0.0"),
            Err(ClientError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_flag_is_per_isn() {
        let ctx = context();
        assert!(ctx.require_isn_admin("maritime").is_ok());
        assert!(ctx.require_isn_admin("weather").is_err());
    }

    #[test]
    fn clones_share_one_snapshot() {
        let ctx = context();
        let copy = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.inner, &copy.inner));
        assert_eq!(copy.access_token(), "h.p.s");
    }

    #[tokio::test]
    async fn extractor_reads_snapshot_from_extensions() {
        let mut request = axum::http::Request::builder()
            .uri("/dashboard")
            .body(())
            .unwrap();
        request.extensions_mut().insert(context());
        let (mut parts, _) = request.into_parts();

        let extracted = AuthContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.account().account_id, "acc-1");
    }

    #[tokio::test]
    async fn extractor_redirects_without_snapshot() {
        let request = axum::http::Request::builder()
            .uri("/dashboard")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let rejection = AuthContext::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), axum::http::StatusCode::SEE_OTHER);
    }
}
