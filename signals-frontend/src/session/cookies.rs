use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use super::codec;
use crate::config::Settings;
use crate::error::ClientError;
use crate::models::{AccessTokenDetails, AccountInfo, IsnPerms};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const ISN_PERMS_COOKIE: &str = "isn_perms";
pub const ACCOUNT_INFO_COOKIE: &str = "account_info";

/// Attributes shared by every cookie in the session set.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    secure: bool,
    same_site: SameSite,
    refresh_cookie_name: String,
    max_age: Duration,
}

impl CookieSettings {
    pub fn new(
        secure: bool,
        same_site: SameSite,
        refresh_cookie_name: impl Into<String>,
        max_age: Duration,
    ) -> Self {
        Self {
            secure,
            same_site,
            refresh_cookie_name: refresh_cookie_name.into(),
            max_age,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.secure_cookies(),
            settings.session.same_site.into(),
            settings.session.refresh_cookie_name.clone(),
            Duration::hours(settings.session.max_age_hours),
        )
    }

    pub fn refresh_cookie_name(&self) -> &str {
        &self.refresh_cookie_name
    }

    /// Encode a complete session cookie set from a login or refresh result.
    ///
    /// Nothing is written here. If any value fails to encode the caller gets
    /// an error and the response carries none of the cookies.
    pub fn issue(
        &self,
        details: &AccessTokenDetails,
        refresh_cookie: &Cookie<'_>,
    ) -> Result<SessionCookies, ClientError> {
        let isn_perms = codec::encode_isn_perms(&details.isn_perms)?;
        let account_info = codec::encode_account_info(&details.account_info())?;
        let refresh_max_age = refresh_cookie.max_age().unwrap_or(self.max_age);

        Ok(SessionCookies {
            cookies: vec![
                self.cookie(ACCESS_TOKEN_COOKIE, details.access_token.clone(), self.max_age),
                self.cookie(
                    &self.refresh_cookie_name,
                    refresh_cookie.value().to_string(),
                    refresh_max_age,
                ),
                self.cookie(ISN_PERMS_COOKIE, isn_perms, self.max_age),
                self.cookie(ACCOUNT_INFO_COOKIE, account_info, self.max_age),
            ],
        })
    }

    /// Expire every cookie in the session set.
    ///
    /// Removal cookies are emitted whether or not the browser sent the
    /// cookies, so clearing is idempotent.
    pub fn clear(&self) -> SessionCookies {
        let names = [
            ACCESS_TOKEN_COOKIE,
            self.refresh_cookie_name.as_str(),
            ISN_PERMS_COOKIE,
            ACCOUNT_INFO_COOKIE,
        ];

        SessionCookies {
            cookies: names
                .into_iter()
                .map(|name| {
                    let mut cookie = self.cookie(name, String::new(), Duration::ZERO);
                    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
                    cookie
                })
                .collect(),
        }
    }

    fn cookie(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(max_age)
            .build()
    }

    /// Read the session cookie set from an incoming request.
    ///
    /// Presence of the access token is checked by the classifier before this
    /// is called. A missing or corrupted permission or account cookie is a
    /// decode error.
    pub fn read(&self, jar: &CookieJar) -> Result<StoredSession, ClientError> {
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ClientError::SessionDecode("access_token cookie missing".into()))?;

        let isn_perms = jar
            .get(ISN_PERMS_COOKIE)
            .ok_or_else(|| ClientError::SessionDecode("isn_perms cookie missing".into()))
            .and_then(|c| codec::decode_isn_perms(c.value()))?;

        let account = jar
            .get(ACCOUNT_INFO_COOKIE)
            .ok_or_else(|| ClientError::SessionDecode("account_info cookie missing".into()))
            .and_then(|c| codec::decode_account_info(c.value()))?;

        Ok(StoredSession {
            access_token,
            refresh_token: self.refresh_token(jar),
            account,
            isn_perms,
        })
    }

    pub fn access_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string())
    }

    pub fn refresh_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.refresh_cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Session state as decoded from request cookies.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub account: AccountInfo,
    pub isn_perms: IsnPerms,
}

/// A fully built group of `Set-Cookie` values, written in one pass.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    cookies: Vec<Cookie<'static>>,
}

impl SessionCookies {
    pub fn apply(self, jar: CookieJar) -> CookieJar {
        self.cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.cookies.iter()
    }
}
