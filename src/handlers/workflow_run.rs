use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{IconType, NotificationTypeHandler, actions_url, repository_url};
use crate::{
    domain::{Link, Notification, NotificationState, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    settings::SettingsState,
};

// GitHub offers no clean API for the deployment review state, so it is parsed
// out of the notification title.
static DEPLOYMENT_REVIEW_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<user>.*?) requested your (?<status>.*?) to deploy to an environment$")
        .expect("valid workflow run title pattern")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowRunAttributes {
    pub user: String,
    pub status: Option<NotificationState>,
    pub status_display_name: String,
}

pub fn workflow_run_attributes(title: &str) -> Option<WorkflowRunAttributes> {
    let captures = DEPLOYMENT_REVIEW_TITLE.captures(title)?;
    let status_display_name = captures["status"].to_owned();

    Some(WorkflowRunAttributes {
        user: captures["user"].to_owned(),
        status: workflow_run_status(&status_display_name),
        status_display_name,
    })
}

fn workflow_run_status(status_display_name: &str) -> Option<NotificationState> {
    match status_display_name {
        "review" => Some(NotificationState::Waiting),
        _ => None,
    }
}

fn workflow_run_url(notification: &Notification) -> Link {
    let filters: Vec<String> = workflow_run_attributes(&notification.subject.title)
        .and_then(|attributes| attributes.status)
        .map(|status| format!("is:{status}"))
        .into_iter()
        .collect();

    actions_url(&repository_url(notification), &filters)
}

pub struct WorkflowRunHandler;

#[async_trait]
impl NotificationTypeHandler for WorkflowRunHandler {
    async fn enrich(
        &self,
        _api: &dyn GitHubApi,
        notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let Some(status) = workflow_run_attributes(&notification.subject.title)
            .and_then(|attributes| attributes.status)
        else {
            return Ok(None);
        };

        Ok(Some(SubjectDetails {
            state: Some(status),
            html_url: Some(workflow_run_url(notification)),
            ..SubjectDetails::default()
        }))
    }

    fn icon_type(&self, _subject: &Subject) -> IconType {
        IconType::Rocket
    }

    fn default_url(&self, notification: &Notification) -> Link {
        workflow_run_url(notification)
    }
}
