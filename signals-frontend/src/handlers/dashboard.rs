use askama::Template;
use axum::response::{IntoResponse, Response};

use crate::context::AuthContext;
use crate::models::AccountInfo;

pub struct NetworkRow<'a> {
    pub slug: &'a str,
    pub permission: &'static str,
    pub is_admin: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub account: &'a AccountInfo,
    pub networks: Vec<NetworkRow<'a>>,
}

impl<'a> DashboardTemplate<'a> {
    /// Networks are listed in slug order.
    pub fn from_context(auth: &'a AuthContext) -> Self {
        let mut networks: Vec<NetworkRow<'a>> = auth
            .isn_perms()
            .iter()
            .map(|(slug, perm)| NetworkRow {
                slug,
                permission: perm.permission.as_str(),
                is_admin: perm.is_admin,
            })
            .collect();
        networks.sort_by(|a, b| a.slug.cmp(b.slug));

        Self {
            account: auth.account(),
            networks,
        }
    }
}

pub async fn dashboard_handler(auth: AuthContext) -> Response {
    DashboardTemplate::from_context(&auth).into_response()
}
