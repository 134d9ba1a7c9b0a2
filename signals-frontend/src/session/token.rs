//! Access token status classification.
//!
//! Claims are decoded without verifying the signature. The token came from
//! the signals API over the network and is only presented back to it; here
//! we only need the expiry and a few display claims.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine as _,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// URL-safe alphabet that accepts both padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Missing,
    Invalid,
    Valid,
    Expired,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Decode the claims segment of a JWT.
pub fn decode_claims(token: &str) -> Option<AccessTokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }

    let payload = URL_SAFE_LENIENT.decode(parts[1]).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// Classify the access token cookie value at `now`.
///
/// A token expiring exactly at `now` is expired.
pub fn classify(token: Option<&str>, now: DateTime<Utc>) -> TokenStatus {
    let Some(token) = token else {
        return TokenStatus::Missing;
    };

    match decode_claims(token) {
        None => TokenStatus::Invalid,
        Some(claims) if claims.exp <= now.timestamp() => TokenStatus::Expired,
        Some(_) => TokenStatus::Valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn token_expiring_at(exp: i64) -> String {
        token_with_payload(&format!(
            r#"{{"sub":"acc-1","exp":{},"iat":1700000000,"account_type":"user","role":"member"}}"#,
            exp
        ))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn absent_cookie_is_missing() {
        assert_eq!(classify(None, now()), TokenStatus::Missing);
    }

    #[test]
    fn past_expiry_is_expired() {
        let past = now().timestamp() - 1;
        assert_eq!(
            classify(Some(&token_expiring_at(past)), now()),
            TokenStatus::Expired
        );
    }

    #[test]
    fn expiry_equal_to_now_is_expired() {
        let exact = now().timestamp();
        assert_eq!(
            classify(Some(&token_expiring_at(exact)), now()),
            TokenStatus::Expired
        );
    }

    #[test]
    fn future_expiry_is_valid() {
        let future = now().timestamp() + 1;
        assert_eq!(
            classify(Some(&token_expiring_at(future)), now()),
            TokenStatus::Valid
        );
    }

    #[test]
    fn malformed_tokens_are_invalid() {
        let cases = [
            String::new(),
            "not-a-jwt".to_string(),
            "a.b".to_string(),
            "a.b.c.d".to_string(),
            format!("header.{}.sig", "!!!"),
            token_with_payload("not json"),
            token_with_payload(r#"{"sub":"acc-1"}"#),
            token_with_payload(r#"{"exp":"tomorrow"}"#),
        ];

        for token in cases {
            assert_eq!(
                classify(Some(&token), now()),
                TokenStatus::Invalid,
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE
            .encode(format!(r#"{{"exp":{}}}"#, now().timestamp() + 60));
        let token = format!("h.{}.s", payload);
        assert_eq!(classify(Some(&token), now()), TokenStatus::Valid);
    }

    #[test]
    fn display_claims_are_decoded() {
        let claims = decode_claims(&token_expiring_at(1)).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("acc-1"));
        assert_eq!(claims.role.as_deref(), Some("member"));
        assert_eq!(claims.account_type.as_deref(), Some("user"));
    }
}
