use axum_extra::extract::cookie::SameSite;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Base URL of the signals API, e.g. http://localhost:8080.
    pub url: String,
    /// Upper bound on every upstream call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Lax,
    Strict,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::Strict => SameSite::Strict,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    /// Secure flag on session cookies. Derived from the environment when unset.
    #[serde(default)]
    pub secure_cookies: Option<bool>,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    /// Name the signals API uses for its refresh token cookie.
    #[serde(default = "default_refresh_cookie_name")]
    pub refresh_cookie_name: String,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    /// How long a successful refresh stays shareable with requests that
    /// still carry the rotated-out refresh token.
    #[serde(default = "default_refresh_grace_ms")]
    pub refresh_grace_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secure_cookies: None,
            same_site: SameSitePolicy::default(),
            refresh_cookie_name: default_refresh_cookie_name(),
            max_age_hours: default_max_age_hours(),
            refresh_grace_ms: default_refresh_grace_ms(),
        }
    }
}

impl SessionSettings {
    pub fn refresh_grace(&self) -> Duration {
        Duration::from_millis(self.refresh_grace_ms)
    }
}

fn default_refresh_cookie_name() -> String {
    "refresh_token".to_string()
}

fn default_max_age_hours() -> i64 {
    24 * 30
}

fn default_refresh_grace_ms() -> u64 {
    5_000
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_json_logs")]
    pub json_logs: bool,
    /// OTLP collector endpoint (e.g. http://tempo:4317). Tracing export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: default_json_logs(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logs() -> bool {
    true
}

impl Settings {
    /// Whether session cookies carry the Secure attribute.
    ///
    /// An explicit `session.secure_cookies` wins; otherwise only local
    /// development runs without it.
    pub fn secure_cookies(&self) -> bool {
        self.session
            .secure_cookies
            .unwrap_or(self.environment != Environment::Local)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("cannot read current dir: {}", e)))?;

    // Check if we're already in signals-frontend directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("signals-frontend") {
        base_path.join("config")
    } else {
        base_path.join("signals-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(environment: Environment, secure_cookies: Option<bool>) -> Settings {
        Settings {
            environment,
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            api: ApiSettings {
                url: "http://localhost:8080".to_string(),
                timeout_ms: default_timeout_ms(),
            },
            session: SessionSettings {
                secure_cookies,
                ..SessionSettings::default()
            },
            telemetry: TelemetrySettings::default(),
        }
    }

    #[test]
    fn secure_flag_follows_environment_when_unset() {
        assert!(!settings(Environment::Local, None).secure_cookies());
        assert!(settings(Environment::Staging, None).secure_cookies());
        assert!(settings(Environment::Production, None).secure_cookies());
    }

    #[test]
    fn explicit_secure_flag_wins() {
        assert!(settings(Environment::Local, Some(true)).secure_cookies());
        assert!(!settings(Environment::Production, Some(false)).secure_cookies());
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = settings(Environment::Local, None);
        assert_eq!(s.api.timeout(), Duration::from_secs(10));
        assert_eq!(s.session.refresh_cookie_name, "refresh_token");
        assert_eq!(s.session.max_age_hours, 720);
        assert_eq!(s.session.same_site, SameSitePolicy::Lax);
    }
}
