use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{IconType, NotificationTypeHandler, actions_url, repository_url};
use crate::{
    domain::{Link, Notification, NotificationState, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    settings::SettingsState,
};

static CHECK_SUITE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<workflow>.*?) workflow run(, Attempt #(?<attempt>\d+))? (?<status>.*?) for (?<branch>.*?) branch$",
    )
    .expect("valid check suite title pattern")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckSuiteAttributes {
    pub workflow_name: String,
    pub attempt_number: Option<u32>,
    pub status_display_name: String,
    pub status: Option<NotificationState>,
    pub branch_name: String,
}

pub fn check_suite_attributes(title: &str) -> Option<CheckSuiteAttributes> {
    let captures = CHECK_SUITE_TITLE.captures(title)?;
    let status_display_name = captures["status"].to_owned();

    Some(CheckSuiteAttributes {
        workflow_name: captures["workflow"].to_owned(),
        attempt_number: captures
            .name("attempt")
            .and_then(|attempt| attempt.as_str().parse().ok()),
        status: check_suite_status(&status_display_name),
        status_display_name,
        branch_name: captures["branch"].to_owned(),
    })
}

fn check_suite_status(status_display_name: &str) -> Option<NotificationState> {
    match status_display_name {
        "cancelled" => Some(NotificationState::Cancelled),
        "failed" | "failed at startup" => Some(NotificationState::Failure),
        "skipped" => Some(NotificationState::Skipped),
        "succeeded" => Some(NotificationState::Success),
        _ => None,
    }
}

fn check_suite_url(notification: &Notification) -> Link {
    let mut filters = Vec::new();
    if let Some(attributes) = check_suite_attributes(&notification.subject.title) {
        filters.push(format!(
            "workflow:\"{}\"",
            attributes.workflow_name.replace(' ', "+")
        ));
        if let Some(status) = attributes.status {
            filters.push(format!("is:{status}"));
        }
        filters.push(format!("branch:{}", attributes.branch_name));
    }

    actions_url(&repository_url(notification), &filters)
}

pub struct CheckSuiteHandler;

#[async_trait]
impl NotificationTypeHandler for CheckSuiteHandler {
    async fn enrich(
        &self,
        _api: &dyn GitHubApi,
        notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let Some(status) = check_suite_attributes(&notification.subject.title)
            .and_then(|attributes| attributes.status)
        else {
            return Ok(None);
        };

        Ok(Some(SubjectDetails {
            state: Some(status),
            html_url: Some(check_suite_url(notification)),
            ..SubjectDetails::default()
        }))
    }

    fn icon_type(&self, subject: &Subject) -> IconType {
        match subject.state {
            Some(NotificationState::Cancelled) => IconType::Stop,
            Some(NotificationState::Failure) => IconType::X,
            Some(NotificationState::Skipped) => IconType::Skip,
            Some(NotificationState::Success) => IconType::Check,
            _ => IconType::Rocket,
        }
    }

    fn default_url(&self, notification: &Notification) -> Link {
        check_suite_url(notification)
    }
}
