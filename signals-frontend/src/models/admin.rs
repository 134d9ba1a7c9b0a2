use serde::{Deserialize, Serialize};

use super::auth::Permission;

/// Account record returned by the admin user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserDetails {
    pub account_id: String,
    pub email: String,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IsnAccountGrant {
    pub permission: Permission,
}
