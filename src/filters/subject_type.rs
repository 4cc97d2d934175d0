use super::Filter;
use crate::{
    domain::{Notification, SubjectType, TypeDetails},
    settings::SettingsState,
};

pub struct SubjectTypeFilter;

pub const SUBJECT_TYPE_FILTER: SubjectTypeFilter = SubjectTypeFilter;

impl Filter for SubjectTypeFilter {
    type Value = SubjectType;

    const REQUIRES_DETAILED_NOTIFICATIONS: bool = false;

    fn type_details(&self, value: &SubjectType) -> TypeDetails {
        let title = match value {
            SubjectType::CheckSuite => "Check Suite",
            SubjectType::Commit => "Commit",
            SubjectType::Discussion => "Discussion",
            SubjectType::Issue => "Issue",
            SubjectType::PullRequest => "Pull Request",
            SubjectType::Release => "Release",
            SubjectType::RepositoryDependabotAlertsThread => "Dependabot Alert",
            SubjectType::RepositoryInvitation => "Invitation",
            SubjectType::RepositoryVulnerabilityAlert => "Vulnerability Alert",
            SubjectType::WorkflowRun => "Workflow Run",
            SubjectType::Other(_) => "Unknown",
        };
        TypeDetails {
            title,
            description: None,
        }
    }

    fn selected<'a>(&self, settings: &'a SettingsState) -> &'a [SubjectType] {
        &settings.filter_subject_types
    }

    fn filter_notification(&self, notification: &Notification, value: &SubjectType) -> bool {
        notification.subject.subject_type == *value
    }
}
