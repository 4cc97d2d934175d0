use async_trait::async_trait;
use tracing::debug;

use super::{IconType, NotificationTypeHandler, repository_url};
use crate::{
    domain::{Link, Notification, Subject, SubjectDetails},
    filters::is_state_filtered_out,
    github::{self, FetchError, GitHubApi},
    settings::SettingsState,
};

pub struct CommitHandler;

#[async_trait]
impl NotificationTypeHandler for CommitHandler {
    async fn enrich(
        &self,
        api: &dyn GitHubApi,
        notification: &Notification,
        settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        // Commits are stateless.
        if is_state_filtered_out(None, settings) {
            debug!(
                notification_id = %notification.id,
                "commit hidden by state filter, skipping fetch"
            );
            return Ok(None);
        }

        let token = &notification.account.token;
        let (user, html_url) = match notification.subject.latest_comment_url.as_deref() {
            Some(comment_url) => {
                let comment = github::get_commit_comment(api, comment_url, token).await?;
                (comment.user, comment.html_url)
            }
            None => {
                let commit_url = notification
                    .subject
                    .url
                    .as_deref()
                    .ok_or(FetchError::MissingSubjectUrl)?;
                let commit = github::get_commit(api, commit_url, token).await?;
                (commit.author, commit.html_url)
            }
        };

        Ok(Some(SubjectDetails {
            state: None,
            user: user.map(Into::into),
            html_url,
            ..SubjectDetails::default()
        }))
    }

    fn icon_type(&self, _subject: &Subject) -> IconType {
        IconType::Commit
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_url(notification)
    }
}
