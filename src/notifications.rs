use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};

use crate::{
    domain::{Account, AccountNotifications, Notification},
    enrich::enrich_notifications,
    filters::{filter_base_notifications, filter_detailed_notifications},
    github::{FetchError, GitHubApi, list_notifications},
    group::stabilize_notifications_order,
    settings::SettingsState,
};

/// Fetches, filters and enriches notifications for every account
/// concurrently, then assigns display order across all of them. A failing
/// account yields an empty list with its failure kind; it never fails the
/// whole pass.
pub async fn get_all_notifications(
    api: &dyn GitHubApi,
    accounts: &[Arc<Account>],
    settings: &SettingsState,
) -> Vec<AccountNotifications> {
    let results = join_all(accounts.iter().map(|account| async move {
        match account_notifications(api, account, settings).await {
            Ok(notifications) => AccountNotifications {
                account: Arc::clone(account),
                notifications,
                error: None,
            },
            Err(err) => {
                error!(
                    account = %account.hostname,
                    error = %err,
                    "error occurred while fetching account notifications"
                );
                AccountNotifications {
                    account: Arc::clone(account),
                    notifications: Vec::new(),
                    error: Some(err.failure_kind()),
                }
            }
        }
    }))
    .await;

    stabilize_notifications_order(&results, settings)
}

async fn account_notifications(
    api: &dyn GitHubApi,
    account: &Arc<Account>,
    settings: &SettingsState,
) -> Result<Vec<Notification>, FetchError> {
    let notifications = list_notifications(api, account, settings).await?;
    let fetched = notifications.len();

    let notifications = filter_base_notifications(notifications, settings);
    let notifications = enrich_notifications(api, notifications, settings).await;
    let notifications = filter_detailed_notifications(notifications, settings);

    debug!(
        account = %account.hostname,
        fetched,
        kept = notifications.len(),
        "fetched account notifications"
    );
    Ok(notifications)
}
