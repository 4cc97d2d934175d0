use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{IconColor, IconType, NotificationTypeHandler, notification_author, repository_path_url};
use crate::{
    domain::{Link, Notification, NotificationState, Subject, SubjectDetails},
    github::{FetchError, GitHubApi},
    graphql::{self, DiscussionComment, DiscussionDetails},
    settings::SettingsState,
};

pub struct DiscussionHandler;

#[async_trait]
impl NotificationTypeHandler for DiscussionHandler {
    fn supports_merged_query_enrichment(&self) -> bool {
        true
    }

    async fn enrich(
        &self,
        api: &dyn GitHubApi,
        notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let discussion = graphql::fetch_discussion_by_number(api, notification).await?;
        Ok(discussion.map(|discussion| discussion_details(notification, discussion)))
    }

    fn enrich_from_node(
        &self,
        notification: &Notification,
        node: Value,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let discussion = graphql::decode_node::<DiscussionDetails>(node)?;
        Ok(discussion.map(|discussion| discussion_details(notification, discussion)))
    }

    fn icon_type(&self, subject: &Subject) -> IconType {
        match subject.state {
            Some(NotificationState::Duplicate) => IconType::DiscussionDuplicate,
            Some(NotificationState::Outdated) => IconType::DiscussionOutdated,
            Some(NotificationState::Resolved) => IconType::DiscussionClosed,
            _ => IconType::Discussion,
        }
    }

    fn icon_color(&self, subject: &Subject) -> IconColor {
        match subject.state {
            Some(NotificationState::Answered) => IconColor::Green,
            Some(NotificationState::Resolved) => IconColor::Purple,
            _ => IconColor::Gray,
        }
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_path_url(notification, "discussions")
    }
}

fn discussion_details(
    notification: &Notification,
    discussion: DiscussionDetails,
) -> SubjectDetails {
    let mut state = if discussion.is_answered.unwrap_or(false) {
        NotificationState::Answered
    } else {
        NotificationState::Open
    };
    // A state reason always wins over the answered flag.
    if let Some(reason) = discussion.state_reason.as_deref() {
        state = NotificationState::from(reason);
    }

    let comments = &discussion.comments.nodes;
    let closest = closest_discussion_comment_or_reply(notification.updated_at, comments);
    let html_url = closest
        .map(|comment| comment.url.clone())
        .unwrap_or_else(|| discussion.url.clone());
    let user = notification_author([
        closest.and_then(|comment| comment.author.clone()).map(Into::into),
        discussion.author.clone().map(Into::into),
    ]);

    SubjectDetails {
        number: Some(discussion.number),
        state: Some(state),
        user,
        comments: Some(discussion.comments.total_count),
        labels: Some(
            discussion
                .labels
                .as_ref()
                .map(|labels| labels.nodes.iter().map(|label| label.name.clone()).collect())
                .unwrap_or_default(),
        ),
        html_url: Some(html_url),
        ..SubjectDetails::default()
    }
}

/// Finds the comment or reply created closest to `target`, scanning every
/// top-level comment followed by its replies. On equal distance the first
/// candidate scanned is kept.
pub fn closest_discussion_comment_or_reply(
    target: DateTime<Utc>,
    comments: &[DiscussionComment],
) -> Option<&DiscussionComment> {
    let candidates = comments.iter().flat_map(|comment| {
        std::iter::once(comment).chain(
            comment
                .replies
                .iter()
                .flat_map(|replies| replies.nodes.iter()),
        )
    });

    let mut closest: Option<(&DiscussionComment, u64)> = None;
    for candidate in candidates {
        let distance = (candidate.created_at - target).num_milliseconds().unsigned_abs();
        match closest {
            Some((_, best)) if distance >= best => {}
            _ => closest = Some((candidate, distance)),
        }
    }
    closest.map(|(comment, _)| comment)
}
