pub mod admin;
pub mod auth;
pub mod signal;

pub use admin::UserDetails;
pub use auth::{
    AccessTokenDetails, AccountInfo, ErrorResponse, IsnPerm, IsnPerms, Permission, Visibility,
};
pub use signal::{SearchParams, SearchSignal};
