//! Cookie-backed session: the access token, the refresh token, and the
//! encoded permission and account snapshots. No server-side session table.

pub mod codec;
pub mod cookies;
pub mod token;

pub use cookies::{
    CookieSettings, SessionCookies, StoredSession, ACCESS_TOKEN_COOKIE, ACCOUNT_INFO_COOKIE,
    ISN_PERMS_COOKIE,
};
pub use token::{classify, decode_claims, AccessTokenClaims, TokenStatus};
