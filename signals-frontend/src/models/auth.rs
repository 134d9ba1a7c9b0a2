use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-ISN permission map keyed by ISN slug.
///
/// An entry exists only when the account has at least read access to that
/// ISN. A missing slug means no access.
pub type IsnPerms = HashMap<String, IsnPerm>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsnPerm {
    pub permission: Permission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_batch_id: Option<String>,
    /// Signal type paths in the form `<slug>/v<semver>`.
    #[serde(default)]
    pub signal_types: Vec<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub is_admin: bool,
}

impl IsnPerm {
    pub fn can_write(&self) -> bool {
        self.permission == Permission::Write
    }

    pub fn allows_signal_type(&self, signal_type_slug: &str, sem_ver: &str) -> bool {
        let path = format!("{}/v{}", signal_type_slug, sem_ver);
        self.signal_types.iter().any(|t| *t == path)
    }
}

/// Identity snapshot kept in its own cookie so render decisions do not need
/// to decode the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub account_type: String,
    pub role: String,
}

/// Login and refresh response body from the signals API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenDetails {
    pub access_token: String,
    pub token_type: String,
    /// Seconds from issuance.
    pub expires_in: i64,
    pub account_id: String,
    pub account_type: String,
    pub role: String,
    #[serde(default)]
    pub isn_perms: IsnPerms,
}

impl AccessTokenDetails {
    pub fn account_info(&self) -> AccountInfo {
        AccountInfo {
            account_id: self.account_id.clone(),
            account_type: self.account_type.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Error body returned by the signals API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}
