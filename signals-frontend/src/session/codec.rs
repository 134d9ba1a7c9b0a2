//! Transport encoding for the permission and account cookies: JSON, then
//! standard base64.
//!
//! Decoding treats the input as untrusted. Anything that does not decode to
//! the expected shape is a [`ClientError::SessionDecode`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ClientError;
use crate::models::{AccountInfo, IsnPerms};

fn encode<T: Serialize>(value: &T) -> Result<String, ClientError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ClientError::Internal(format!("failed to serialise session value: {}", e)))?;
    Ok(STANDARD.encode(json))
}

fn decode<T: DeserializeOwned>(encoded: &str, what: &str) -> Result<T, ClientError> {
    let json = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ClientError::SessionDecode(format!("{} is not valid base64: {}", what, e)))?;

    serde_json::from_slice(&json)
        .map_err(|e| ClientError::SessionDecode(format!("{} is not valid JSON: {}", what, e)))
}

pub fn encode_isn_perms(perms: &IsnPerms) -> Result<String, ClientError> {
    encode(perms)
}

pub fn decode_isn_perms(encoded: &str) -> Result<IsnPerms, ClientError> {
    decode(encoded, "isn_perms")
}

pub fn encode_account_info(info: &AccountInfo) -> Result<String, ClientError> {
    encode(info)
}

pub fn decode_account_info(encoded: &str) -> Result<AccountInfo, ClientError> {
    decode(encoded, "account_info")
}
