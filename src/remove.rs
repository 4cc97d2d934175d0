use std::collections::HashSet;

use crate::{
    domain::{Account, AccountNotifications},
    settings::SettingsState,
};

/// Read or done notifications stay listed (as read) when the state change is
/// delayed or read notifications are fetched anyway.
pub fn should_remove_notifications_from_state(settings: &SettingsState) -> bool {
    !settings.delay_notification_state && !settings.fetch_read_notifications
}

/// Drops `notification_ids` from `account`'s list, or marks them read when
/// they must stay listed. Other accounts are returned unchanged.
pub fn remove_notifications_for_account(
    account: &Account,
    settings: &SettingsState,
    notification_ids: &[&str],
    accounts: Vec<AccountNotifications>,
) -> Vec<AccountNotifications> {
    if notification_ids.is_empty() {
        return accounts;
    }

    let ids: HashSet<&str> = notification_ids.iter().copied().collect();
    let remove = should_remove_notifications_from_state(settings);
    let uuid = account.uuid();

    accounts
        .into_iter()
        .map(|mut entry| {
            if entry.account.uuid() != uuid {
                return entry;
            }

            if remove {
                entry
                    .notifications
                    .retain(|notification| !ids.contains(notification.id.as_str()));
            } else {
                for notification in &mut entry.notifications {
                    if ids.contains(notification.id.as_str()) {
                        notification.unread = false;
                    }
                }
            }
            entry
        })
        .collect()
}

pub fn notification_count(accounts: &[AccountNotifications]) -> usize {
    accounts.iter().map(|account| account.notifications.len()).sum()
}

pub fn unread_notification_count(accounts: &[AccountNotifications]) -> usize {
    accounts
        .iter()
        .flat_map(|account| account.notifications.iter())
        .filter(|notification| notification.unread)
        .count()
}
