use super::Filter;
use crate::{
    domain::{Notification, NotificationState, TypeDetails},
    settings::{FilterStateType, SettingsState},
};

pub struct StateFilter;

pub const STATE_FILTER: StateFilter = StateFilter;

impl Filter for StateFilter {
    type Value = FilterStateType;

    const REQUIRES_DETAILED_NOTIFICATIONS: bool = true;

    fn type_details(&self, value: &FilterStateType) -> TypeDetails {
        match value {
            FilterStateType::Draft => TypeDetails {
                title: "Draft",
                description: None,
            },
            FilterStateType::Open => TypeDetails {
                title: "Open",
                description: Some("Open or reopened"),
            },
            FilterStateType::Merged => TypeDetails {
                title: "Merged",
                description: None,
            },
            FilterStateType::Closed => TypeDetails {
                title: "Closed",
                description: Some("Closed, completed, duplicate, resolved or not planned"),
            },
            FilterStateType::Other => TypeDetails {
                title: "Other",
                description: Some("Catch all for any other notification states"),
            },
        }
    }

    fn selected<'a>(&self, settings: &'a SettingsState) -> &'a [FilterStateType] {
        &settings.filter_states
    }

    fn filter_notification(&self, notification: &Notification, value: &FilterStateType) -> bool {
        map_state_to_filter(notification.subject.state.as_ref()) == *value
    }
}

/// Buckets a granular subject state; anything unrecognized is `Other`.
pub fn map_state_to_filter(state: Option<&NotificationState>) -> FilterStateType {
    match state {
        Some(NotificationState::Open | NotificationState::Reopened) => FilterStateType::Open,
        Some(
            NotificationState::Closed
            | NotificationState::Completed
            | NotificationState::Duplicate
            | NotificationState::NotPlanned
            | NotificationState::Resolved,
        ) => FilterStateType::Closed,
        Some(NotificationState::MergeQueue | NotificationState::Merged) => FilterStateType::Merged,
        Some(NotificationState::Draft) => FilterStateType::Draft,
        _ => FilterStateType::Other,
    }
}
