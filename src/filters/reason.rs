use super::Filter;
use crate::{
    domain::{Notification, Reason, TypeDetails},
    settings::SettingsState,
};

const UNKNOWN_REASON: TypeDetails = TypeDetails {
    title: "Unknown",
    description: Some("The reason for this notification is not supported by the app."),
};

/// Display title and description for a GitHub notification reason code.
pub fn reason_details(reason: &Reason) -> TypeDetails {
    let (title, description) = match reason {
        Reason::ApprovalRequested => (
            "Approval Requested",
            "You were requested to review and approve a deployment.",
        ),
        Reason::Assign => ("Assigned", "You were assigned to the issue."),
        Reason::Author => ("Authored", "You created the thread."),
        Reason::CiActivity => (
            "Workflow Run Completed",
            "A GitHub Actions workflow run was triggered for your repository.",
        ),
        Reason::Comment => ("Commented", "You commented on the thread."),
        Reason::Invitation => (
            "Invitation Received",
            "You accepted an invitation to contribute to the repository.",
        ),
        Reason::Manual => (
            "Updated",
            "You subscribed to the thread (via an issue or pull request).",
        ),
        Reason::MemberFeatureRequested => (
            "Member Feature Requested",
            "Organization members have requested to enable a feature such as Draft Pull Requests or Copilot.",
        ),
        Reason::Mention => (
            "Mentioned",
            "You were specifically @mentioned in the content.",
        ),
        Reason::ReviewRequested => (
            "Review Requested",
            "You, or a team you're a member of, were requested to review a pull request.",
        ),
        Reason::SecurityAdvisoryCredit => (
            "Security Advisory Credit Received",
            "You were credited for contributing to a security advisory.",
        ),
        Reason::SecurityAlert => (
            "Security Alert Received",
            "GitHub discovered a security vulnerability in your repository.",
        ),
        Reason::StateChange => (
            "State Changed",
            "You changed the thread state (for example, closing an issue or merging a pull request).",
        ),
        Reason::Subscribed => ("Updated", "You're watching the repository."),
        Reason::TeamMention => (
            "Team Mentioned",
            "You were on a team that was mentioned.",
        ),
        Reason::Other(_) => return UNKNOWN_REASON,
    };

    TypeDetails {
        title,
        description: Some(description),
    }
}

pub struct ReasonFilter;

pub const REASON_FILTER: ReasonFilter = ReasonFilter;

impl Filter for ReasonFilter {
    type Value = Reason;

    const REQUIRES_DETAILED_NOTIFICATIONS: bool = false;

    fn type_details(&self, value: &Reason) -> TypeDetails {
        reason_details(value)
    }

    fn selected<'a>(&self, settings: &'a SettingsState) -> &'a [Reason] {
        &settings.filter_reasons
    }

    fn filter_notification(&self, notification: &Notification, value: &Reason) -> bool {
        notification.reason == *value
    }
}
