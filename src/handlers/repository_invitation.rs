use async_trait::async_trait;

use super::{IconType, NotificationTypeHandler, repository_path_url};
use crate::{
    domain::{Link, Notification, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    settings::SettingsState,
};

pub struct RepositoryInvitationHandler;

#[async_trait]
impl NotificationTypeHandler for RepositoryInvitationHandler {
    async fn enrich(
        &self,
        _api: &dyn GitHubApi,
        _notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        Ok(None)
    }

    fn icon_type(&self, _subject: &Subject) -> IconType {
        IconType::Mail
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_path_url(notification, "invitations")
    }
}
