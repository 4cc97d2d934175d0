use async_trait::async_trait;

use super::{IconType, NotificationTypeHandler, repository_url};
use crate::{
    domain::{Link, Notification, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    settings::SettingsState,
};

/// Fallback for subject types without dedicated support. Never touches the
/// network.
pub struct DefaultHandler;

#[async_trait]
impl NotificationTypeHandler for DefaultHandler {
    async fn enrich(
        &self,
        _api: &dyn GitHubApi,
        _notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        Ok(None)
    }

    fn icon_type(&self, _subject: &Subject) -> IconType {
        IconType::Question
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_url(notification)
    }
}
