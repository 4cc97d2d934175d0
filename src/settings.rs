use serde::{Deserialize, Serialize};

use crate::domain::{Reason, SubjectType, UserType};

/// How the notification list is grouped for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupBy {
    Date,
    #[default]
    Repository,
}

/// Coarse state buckets offered by the state filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStateType {
    Open,
    Closed,
    Merged,
    Draft,
    Other,
}

/// Read-only settings consumed by the enrichment, filter and ordering passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsState {
    pub group_by: GroupBy,
    pub detailed_notifications: bool,
    pub delay_notification_state: bool,
    pub participating: bool,
    pub fetch_all_notifications: bool,
    pub fetch_read_notifications: bool,
    pub filter_reasons: Vec<Reason>,
    pub filter_subject_types: Vec<SubjectType>,
    pub filter_user_types: Vec<UserType>,
    pub filter_states: Vec<FilterStateType>,
    pub filter_include_search_tokens: Vec<String>,
    pub filter_exclude_search_tokens: Vec<String>,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Repository,
            detailed_notifications: true,
            delay_notification_state: false,
            participating: false,
            fetch_all_notifications: true,
            fetch_read_notifications: false,
            filter_reasons: Vec::new(),
            filter_subject_types: Vec::new(),
            filter_user_types: Vec::new(),
            filter_states: Vec::new(),
            filter_include_search_tokens: Vec::new(),
            filter_exclude_search_tokens: Vec::new(),
        }
    }
}

impl SettingsState {
    pub fn is_group_by_repository(&self) -> bool {
        self.group_by == GroupBy::Repository
    }
}
