// Every subject type maps to one handler; `DefaultHandler` covers the rest.

mod check_suite;
mod commit;
mod default;
mod discussion;
mod issue;
mod pull_request;
mod release;
mod repository_invitation;
mod workflow_run;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::{
    domain::{Link, Notification, NotificationUser, Subject, SubjectDetails, SubjectType, UserType},
    github::{FetchError, GitHubApi},
    settings::SettingsState,
};

pub use check_suite::{CheckSuiteAttributes, CheckSuiteHandler, check_suite_attributes};
pub use commit::CommitHandler;
pub use default::DefaultHandler;
pub use discussion::{DiscussionHandler, closest_discussion_comment_or_reply};
pub use issue::IssueHandler;
pub use pull_request::{PullRequestHandler, latest_review_for_reviewers};
pub use release::ReleaseHandler;
pub use repository_invitation::RepositoryInvitationHandler;
pub use workflow_run::{WorkflowRunAttributes, WorkflowRunHandler, workflow_run_attributes};

/// Octicon shown next to a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconType {
    Question,
    IssueOpened,
    IssueClosed,
    IssueReopened,
    Skip,
    PullRequest,
    PullRequestDraft,
    PullRequestClosed,
    MergeQueue,
    Merge,
    Discussion,
    DiscussionDuplicate,
    DiscussionOutdated,
    DiscussionClosed,
    Commit,
    Tag,
    Rocket,
    Mail,
    Stop,
    X,
    Check,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconColor {
    Gray,
    Green,
    Red,
    Purple,
    Yellow,
}

/// Capability contract shared by every subject-type handler.
#[async_trait]
pub trait NotificationTypeHandler: Send + Sync {
    /// Whether this type's lookup could be folded into one batched GraphQL
    /// query spanning many notifications.
    fn supports_merged_query_enrichment(&self) -> bool {
        false
    }

    /// Derives additional subject fields. `Ok(None)` means there is nothing to
    /// add, which is not an error.
    async fn enrich(
        &self,
        api: &dyn GitHubApi,
        notification: &Notification,
        settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError>;

    /// Same as [`NotificationTypeHandler::enrich`] but from the entity node of
    /// a batched query that was already fetched. A `null` node means the
    /// entity is gone.
    fn enrich_from_node(
        &self,
        _notification: &Notification,
        _node: Value,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        Ok(None)
    }

    fn icon_type(&self, subject: &Subject) -> IconType;

    fn icon_color(&self, _subject: &Subject) -> IconColor {
        IconColor::Gray
    }

    fn default_url(&self, notification: &Notification) -> Link;

    fn default_user_type(&self) -> UserType {
        UserType::User
    }
}

pub fn handler_for(subject_type: &SubjectType) -> &'static dyn NotificationTypeHandler {
    match subject_type {
        SubjectType::CheckSuite => &CheckSuiteHandler,
        SubjectType::Commit => &CommitHandler,
        SubjectType::Discussion => &DiscussionHandler,
        SubjectType::Issue => &IssueHandler,
        SubjectType::PullRequest => &PullRequestHandler,
        SubjectType::Release => &ReleaseHandler,
        SubjectType::RepositoryInvitation => &RepositoryInvitationHandler,
        SubjectType::WorkflowRun => &WorkflowRunHandler,
        _ => &DefaultHandler,
    }
}

/// Picks the first available user in priority order.
pub fn notification_author<I>(candidates: I) -> Option<NotificationUser>
where
    I: IntoIterator<Item = Option<NotificationUser>>,
{
    candidates.into_iter().flatten().next()
}

/// Web URL of the notification's repository, or the account host when the
/// repository is unknown.
pub fn repository_url(notification: &Notification) -> Link {
    notification
        .repository
        .as_ref()
        .map(|repository| repository.html_url.clone())
        .unwrap_or_else(|| notification.account.web_url())
}

pub fn repository_path_url(notification: &Notification, path: &str) -> Link {
    format!("{}/{path}", repository_url(notification).trim_end_matches('/'))
}

/// Builds the Actions tab URL with an optional search query, encoded the way
/// GitHub's own filter links are.
pub fn actions_url(repository_url: &str, filters: &[String]) -> Link {
    let base = format!("{}/actions", repository_url.trim_end_matches('/'));
    if filters.is_empty() {
        return base;
    }

    let query = filters.join(" ");
    match Url::parse_with_params(&base, &[("query", query.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => base,
    }
}
