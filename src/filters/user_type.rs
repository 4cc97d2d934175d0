use super::Filter;
use crate::{
    domain::{Notification, NotificationUser, TypeDetails, UserType},
    settings::SettingsState,
};

pub struct UserTypeFilter;

pub const USER_TYPE_FILTER: UserTypeFilter = UserTypeFilter;

impl Filter for UserTypeFilter {
    type Value = UserType;

    const REQUIRES_DETAILED_NOTIFICATIONS: bool = true;

    fn type_details(&self, value: &UserType) -> TypeDetails {
        match value {
            UserType::User | UserType::EnterpriseUserAccount => TypeDetails {
                title: "User",
                description: None,
            },
            UserType::Bot => TypeDetails {
                title: "Bot",
                description: Some("Bot accounts such as @dependabot, @renovate, @netlify, etc"),
            },
            UserType::Organization => TypeDetails {
                title: "Organization",
                description: None,
            },
            UserType::Mannequin => TypeDetails {
                title: "Mannequin",
                description: Some("Placeholder accounts for imported contributions"),
            },
            UserType::Other(_) => TypeDetails {
                title: "Unknown",
                description: None,
            },
        }
    }

    fn selected<'a>(&self, settings: &'a SettingsState) -> &'a [UserType] {
        &settings.filter_user_types
    }

    fn filter_notification(&self, notification: &Notification, value: &UserType) -> bool {
        user_matches_type(notification.subject.user.as_ref(), value)
    }
}

/// `User` also covers Enterprise managed user accounts.
pub(super) fn user_matches_type(user: Option<&NotificationUser>, user_type: &UserType) -> bool {
    let Some(user) = user else {
        return false;
    };

    match user_type {
        UserType::User => matches!(
            user.user_type,
            UserType::User | UserType::EnterpriseUserAccount
        ),
        other => user.user_type == *other,
    }
}

pub fn is_non_human_user(user_type: &UserType) -> bool {
    matches!(
        user_type,
        UserType::Bot | UserType::Organization | UserType::Mannequin
    )
}
