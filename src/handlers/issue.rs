use async_trait::async_trait;
use serde_json::Value;

use super::{IconColor, IconType, NotificationTypeHandler, notification_author, repository_path_url};
use crate::{
    domain::{Link, Notification, NotificationState, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    graphql::{self, IssueDetails},
    settings::SettingsState,
};

pub struct IssueHandler;

#[async_trait]
impl NotificationTypeHandler for IssueHandler {
    fn supports_merged_query_enrichment(&self) -> bool {
        true
    }

    async fn enrich(
        &self,
        api: &dyn GitHubApi,
        notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let issue = graphql::fetch_issue_by_number(api, notification).await?;
        Ok(issue.map(issue_details))
    }

    fn enrich_from_node(
        &self,
        _notification: &Notification,
        node: Value,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let issue = graphql::decode_node::<IssueDetails>(node)?;
        Ok(issue.map(issue_details))
    }

    fn icon_type(&self, subject: &Subject) -> IconType {
        match subject.state {
            Some(NotificationState::Closed | NotificationState::Completed) => IconType::IssueClosed,
            Some(NotificationState::Duplicate | NotificationState::NotPlanned) => IconType::Skip,
            Some(NotificationState::Reopened) => IconType::IssueReopened,
            _ => IconType::IssueOpened,
        }
    }

    fn icon_color(&self, subject: &Subject) -> IconColor {
        match subject.state {
            Some(NotificationState::Open | NotificationState::Reopened) => IconColor::Green,
            Some(NotificationState::Closed) => IconColor::Red,
            Some(NotificationState::Completed) => IconColor::Purple,
            _ => IconColor::Gray,
        }
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_path_url(notification, "issues")
    }
}

fn issue_details(issue: IssueDetails) -> SubjectDetails {
    let state = issue
        .state_reason
        .as_deref()
        .map(NotificationState::from)
        .unwrap_or_else(|| NotificationState::from(issue.state.as_str()));

    let comment = issue.comments.nodes.into_iter().next();
    let html_url = comment
        .as_ref()
        .map(|comment| comment.url.clone())
        .unwrap_or(issue.url);
    let user = notification_author([
        comment.and_then(|comment| comment.author).map(Into::into),
        issue.author.map(Into::into),
    ]);

    SubjectDetails {
        number: Some(issue.number),
        state: Some(state),
        user,
        comments: Some(issue.comments.total_count),
        labels: Some(
            issue
                .labels
                .map(|labels| labels.nodes.into_iter().map(|label| label.name).collect())
                .unwrap_or_default(),
        ),
        milestone: issue.milestone,
        html_url: Some(html_url),
        ..SubjectDetails::default()
    }
}
