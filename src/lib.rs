pub mod domain;
pub mod enrich;
pub mod filters;
pub mod formatters;
pub mod github;
pub mod graphql;
pub mod group;
pub mod handlers;
pub mod notifications;
pub mod remove;
pub mod settings;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use enrich::{enrich_notification, enrich_notifications};
pub use github::{GitHubApi, HttpClient};
pub use group::stabilize_notifications_order;
pub use notifications::get_all_notifications;
pub use settings::SettingsState;
