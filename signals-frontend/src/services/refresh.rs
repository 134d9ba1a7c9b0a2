//! Single-flight coordination of access token refreshes.
//!
//! Refresh tokens rotate on use, so two refresh calls with the same token
//! race: the loser gets an invalid-token error and the user is signed out.
//! Concurrent requests carrying the same refresh token therefore share one
//! upstream call and its result.

use axum_extra::extract::cookie::Cookie;
use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use crate::error::ClientError;
use crate::models::AccessTokenDetails;
use crate::services::{auth_client::AuthClient, metrics};

/// Result of a successful refresh: new token details and the rotated
/// refresh token cookie.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub details: AccessTokenDetails,
    pub refresh_cookie: Cookie<'static>,
}

pub type RefreshResult = Result<RefreshedSession, ClientError>;

#[derive(Clone)]
struct Flight {
    id: u64,
    result: Shared<BoxFuture<'static, RefreshResult>>,
}

pub struct RefreshCoordinator {
    client: Arc<AuthClient>,
    flights: Arc<DashMap<String, Flight>>,
    next_id: AtomicU64,
    grace: Duration,
}

impl RefreshCoordinator {
    /// `grace` is how long a successful result stays available to requests
    /// that arrive late with the rotated-out refresh token. Failures are
    /// released at once.
    pub fn new(client: Arc<AuthClient>, grace: Duration) -> Self {
        Self {
            client,
            flights: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            grace,
        }
    }

    /// Refresh the session identified by `refresh_token`, joining an
    /// outstanding refresh for the same token if there is one.
    ///
    /// The upstream call runs on its own task. Dropping this future does
    /// not cancel it for the other waiters.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> RefreshResult {
        let flight = match self.flights.entry(refresh_token.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Joining in-flight session refresh");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let flight = self.launch(access_token, refresh_token);
                entry.insert(flight.clone());
                flight
            }
        };

        flight.result.await
    }

    /// Number of refresh results currently held, in flight or in grace.
    pub fn tracked(&self) -> usize {
        self.flights.len()
    }

    fn launch(&self, access_token: &str, refresh_token: &str) -> Flight {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let client = self.client.clone();
        let access_token = access_token.to_string();
        let refresh_token_owned = refresh_token.to_string();
        let call = tokio::spawn(async move {
            let outcome = client
                .refresh_token(&access_token, &refresh_token_owned)
                .await
                .map(|(details, refresh_cookie)| RefreshedSession {
                    details,
                    refresh_cookie,
                });

            match &outcome {
                Ok(session) => {
                    metrics::record_refresh("success");
                    tracing::info!(
                        account_id = %session.details.account_id,
                        "Access token refreshed"
                    );
                }
                Err(e) => {
                    metrics::record_refresh(e.kind());
                    tracing::warn!(
                        error_kind = e.kind(),
                        terminal = e.is_terminal(),
                        "Access token refresh failed"
                    );
                }
            }
            outcome
        });

        let result = async move {
            call.await.unwrap_or_else(|e| {
                Err(ClientError::Internal(format!("refresh task failed: {}", e)))
            })
        }
        .boxed()
        .shared();

        // Release the key once the call settles. A successful result is kept
        // for the grace period; the key is only removed if it still belongs
        // to this flight.
        let flights = self.flights.clone();
        let key = refresh_token.to_string();
        let grace = self.grace;
        let settled = result.clone();
        tokio::spawn(async move {
            if settled.await.is_ok() {
                tokio::time::sleep(grace).await;
            }
            flights.remove_if(&key, |_, flight| flight.id == id);
        });

        Flight { id, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSettings;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coordinator(url: &str) -> RefreshCoordinator {
        coordinator_with_grace(url, Duration::from_millis(50))
    }

    fn coordinator_with_grace(url: &str, grace: Duration) -> RefreshCoordinator {
        let settings = ApiSettings {
            url: url.to_string(),
            timeout_ms: 500,
        };
        let client = AuthClient::new(&settings, "refresh_token").unwrap();
        RefreshCoordinator::new(Arc::new(client), grace)
    }

    async fn wait_until_untracked(coordinator: &RefreshCoordinator) {
        for _ in 0..100 {
            if coordinator.tracked() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn successful_refresh_is_held_for_grace_then_released() {
        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "refresh_token=rotated; Path=/; HttpOnly")
                    .set_body_json(serde_json::json!({
                        "access_token": "h.p.s",
                        "token_type": "Bearer",
                        "expires_in": 1800,
                        "account_id": "acc-1",
                        "account_type": "user",
                        "role": "member",
                    })),
            )
            .expect(1)
            .mount(&api)
            .await;

        let coordinator = coordinator_with_grace(&api.uri(), Duration::from_millis(300));

        let first = coordinator.refresh("h.p.s", "refresh-1").await.unwrap();
        assert_eq!(first.refresh_cookie.value(), "rotated");
        assert_eq!(coordinator.tracked(), 1);

        // Within grace the same token gets the same result without a new call.
        let again = coordinator.refresh("h.p.s", "refresh-1").await.unwrap();
        assert_eq!(again.details.account_id, "acc-1");

        wait_until_untracked(&coordinator).await;
        assert_eq!(coordinator.tracked(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_releases_its_key() {
        // Nothing listens on port 9; the call fails fast with a network error.
        let coordinator = coordinator("http://127.0.0.1:9");

        let err = coordinator.refresh("h.p.s", "refresh-1").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout));

        wait_until_untracked(&coordinator).await;
        assert_eq!(coordinator.tracked(), 0);
    }
}
