pub mod auth_client;
pub mod metrics;
pub mod refresh;

pub use auth_client::AuthClient;
pub use refresh::{RefreshCoordinator, RefreshResult, RefreshedSession};
