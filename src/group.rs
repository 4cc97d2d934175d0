use indexmap::IndexMap;

use crate::{
    domain::{AccountNotifications, Notification},
    settings::SettingsState,
};

/// Groups notifications by repository full name, keeping the order in which
/// each repository is first seen. Notifications without a repository are
/// skipped.
pub fn group_notifications_by_repository(
    notifications: &[Notification],
) -> IndexMap<&str, Vec<&Notification>> {
    let mut groups: IndexMap<&str, Vec<&Notification>> = IndexMap::new();
    for notification in notifications {
        if let Some(repository) = &notification.repository {
            groups
                .entry(repository.full_name.as_str())
                .or_default()
                .push(notification);
        }
    }
    groups
}

/// Notifications in display order: fetch order when grouping by date,
/// repository groups flattened otherwise, with notifications lacking a
/// repository last. Matches the `order` assigned by
/// [`stabilize_notifications_order`].
pub fn flattened_notifications_by_repo<'a>(
    notifications: &'a [Notification],
    settings: &SettingsState,
) -> Vec<&'a Notification> {
    display_positions(notifications, settings)
        .into_iter()
        .map(|index| &notifications[index])
        .collect()
}

/// Assigns `order` with one counter running across all accounts, so that
/// display order stays stable while notifications are read or dismissed.
/// Returns new account lists; the input is left untouched.
pub fn stabilize_notifications_order(
    accounts: &[AccountNotifications],
    settings: &SettingsState,
) -> Vec<AccountNotifications> {
    let mut next_order = 0;

    accounts
        .iter()
        .map(|account| {
            let mut notifications = account.notifications.clone();
            for index in display_positions(&account.notifications, settings) {
                notifications[index].order = next_order;
                next_order += 1;
            }

            AccountNotifications {
                account: account.account.clone(),
                notifications,
                error: account.error,
            }
        })
        .collect()
}

/// Indices into `notifications` in display order. Notifications without a
/// repository trail the grouped ones when grouping by repository, so every
/// notification still gets an order.
fn display_positions(notifications: &[Notification], settings: &SettingsState) -> Vec<usize> {
    if !settings.is_group_by_repository() {
        return (0..notifications.len()).collect();
    }

    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    let mut ungrouped = Vec::new();
    for (index, notification) in notifications.iter().enumerate() {
        match &notification.repository {
            Some(repository) => groups
                .entry(repository.full_name.as_str())
                .or_default()
                .push(index),
            None => ungrouped.push(index),
        }
    }

    groups.into_values().flatten().chain(ungrouped).collect()
}
