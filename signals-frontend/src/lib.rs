pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod htmx;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;
pub mod telemetry;

use config::Settings;
use error::ClientError;
use services::{auth_client::AuthClient, refresh::RefreshCoordinator};
use session::CookieSettings;
use std::sync::Arc;

/// Shared application state: the signals API client, the refresh
/// coordinator, and the session cookie attributes.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: Arc<AuthClient>,
    pub refresher: Arc<RefreshCoordinator>,
    pub cookies: Arc<CookieSettings>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let auth_client = Arc::new(AuthClient::new(
            &settings.api,
            settings.session.refresh_cookie_name.clone(),
        )?);
        let refresher = Arc::new(RefreshCoordinator::new(
            auth_client.clone(),
            settings.session.refresh_grace(),
        ));

        Ok(Self {
            auth_client,
            refresher,
            cookies: Arc::new(CookieSettings::from_settings(settings)),
        })
    }
}
