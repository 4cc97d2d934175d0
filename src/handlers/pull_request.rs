use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use super::{IconColor, IconType, NotificationTypeHandler, notification_author, repository_path_url};
use crate::{
    domain::{
        Link, Notification, NotificationState, PullRequestReview, ReviewState, Subject,
        SubjectDetails,
    },
    formatters::format_github_number,
    github::{FetchError, GitHubApi},
    graphql::{self, PullRequestDetails, PullRequestReviewFields},
    settings::SettingsState,
};

pub struct PullRequestHandler;

#[async_trait]
impl NotificationTypeHandler for PullRequestHandler {
    fn supports_merged_query_enrichment(&self) -> bool {
        true
    }

    async fn enrich(
        &self,
        api: &dyn GitHubApi,
        notification: &Notification,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let pr = graphql::fetch_pull_by_number(api, notification).await?;
        Ok(pr.map(pull_request_details))
    }

    fn enrich_from_node(
        &self,
        _notification: &Notification,
        node: Value,
        _settings: &SettingsState,
    ) -> Result<Option<SubjectDetails>, FetchError> {
        let pr = graphql::decode_node::<PullRequestDetails>(node)?;
        Ok(pr.map(pull_request_details))
    }

    fn icon_type(&self, subject: &Subject) -> IconType {
        match subject.state {
            Some(NotificationState::Draft) => IconType::PullRequestDraft,
            Some(NotificationState::Closed) => IconType::PullRequestClosed,
            Some(NotificationState::MergeQueue) => IconType::MergeQueue,
            Some(NotificationState::Merged) => IconType::Merge,
            _ => IconType::PullRequest,
        }
    }

    fn icon_color(&self, subject: &Subject) -> IconColor {
        match subject.state {
            Some(NotificationState::Open) => IconColor::Green,
            Some(NotificationState::Closed) => IconColor::Red,
            Some(NotificationState::MergeQueue) => IconColor::Yellow,
            Some(NotificationState::Merged) => IconColor::Purple,
            _ => IconColor::Gray,
        }
    }

    fn default_url(&self, notification: &Notification) -> Link {
        repository_path_url(notification, "pulls")
    }
}

fn pull_request_details(pr: PullRequestDetails) -> SubjectDetails {
    // Draft and merge queue are presentation states over open/closed/merged.
    let state = if pr.is_draft {
        NotificationState::Draft
    } else if pr.is_in_merge_queue {
        NotificationState::MergeQueue
    } else {
        NotificationState::from(pr.state.as_str())
    };

    let reviews = latest_review_for_reviewers(&pr.reviews.nodes);
    let comment = pr.comments.nodes.into_iter().next();
    let html_url = comment
        .as_ref()
        .map(|comment| comment.url.clone())
        .unwrap_or(pr.url);
    let user = notification_author([
        comment.and_then(|comment| comment.author).map(Into::into),
        pr.author.map(Into::into),
    ]);

    SubjectDetails {
        number: Some(pr.number),
        state: Some(state),
        user,
        reviews,
        comments: Some(pr.comments.total_count),
        labels: Some(
            pr.labels
                .map(|labels| labels.nodes.into_iter().map(|label| label.name).collect())
                .unwrap_or_default(),
        ),
        linked_issues: pr.closing_issues_references.map(|issues| {
            issues
                .nodes
                .iter()
                .map(|issue| format_github_number(issue.number))
                .collect()
        }),
        milestone: pr.milestone,
        html_url: Some(html_url),
    }
}

/// Keeps only each reviewer's most recent review, then groups reviewers by
/// review state, ordered by state name.
///
/// `reviews` must be in chronological order, as GitHub returns them.
pub fn latest_review_for_reviewers(
    reviews: &[PullRequestReviewFields],
) -> Option<Vec<PullRequestReview>> {
    if reviews.is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let mut grouped: Vec<PullRequestReview> = Vec::new();
    for review in reviews.iter().rev() {
        let Some(author) = &review.author else {
            continue;
        };
        if !seen.insert(author.login.as_str()) {
            continue;
        }

        let state = ReviewState::from(review.state.as_str());
        match grouped.iter_mut().find(|group| group.state == state) {
            Some(group) => group.users.push(author.login.clone()),
            None => grouped.push(PullRequestReview {
                state,
                users: vec![author.login.clone()],
            }),
        }
    }

    grouped.sort_by(|a, b| a.state.as_str().cmp(b.state.as_str()));
    Some(grouped)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        domain::SubjectType,
        graphql::ReviewAuthor,
        test_support::{MockApi, notification},
    };

    fn review(login: &str, state: &str) -> PullRequestReviewFields {
        PullRequestReviewFields {
            state: state.to_owned(),
            author: Some(ReviewAuthor {
                login: login.to_owned(),
            }),
        }
    }

    fn pull_node(state: &str, is_draft: bool, is_in_merge_queue: bool) -> Value {
        json!({
            "number": 123,
            "url": "https://github.com/gitify-app/notifications-test/pull/123",
            "state": state,
            "isDraft": is_draft,
            "isInMergeQueue": is_in_merge_queue,
            "author": {
                "login": "pr-author",
                "url": "https://github.com/pr-author",
                "avatarUrl": "https://avatars.githubusercontent.com/pr-author",
                "__typename": "User"
            },
            "comments": { "totalCount": 0, "nodes": [] },
            "reviews": { "totalCount": 2, "nodes": [
                { "state": "CHANGES_REQUESTED", "author": { "login": "reviewer1" } },
                { "state": "APPROVED", "author": { "login": "reviewer1" } }
            ] },
            "labels": { "nodes": [] },
            "closingIssuesReferences": { "nodes": [{ "number": 789 }] },
            "milestone": null
        })
    }

    fn pull_response(state: &str, is_draft: bool, is_in_merge_queue: bool) -> Value {
        json!({ "repository": { "pullRequest": pull_node(state, is_draft, is_in_merge_queue) } })
    }

    async fn enrich_state(state: &str, is_draft: bool, is_in_merge_queue: bool) -> SubjectDetails {
        let api = MockApi::new().with_graphql(
            "FetchPullByNumber",
            pull_response(state, is_draft, is_in_merge_queue),
        );
        PullRequestHandler
            .enrich(&api, &notification(SubjectType::PullRequest), &SettingsState::default())
            .await
            .expect("enrich")
            .expect("details")
    }

    #[tokio::test]
    async fn resolves_canonical_and_presentation_states() {
        assert_eq!(
            enrich_state("OPEN", false, false).await.state,
            Some(NotificationState::Open)
        );
        assert_eq!(
            enrich_state("MERGED", false, false).await.state,
            Some(NotificationState::Merged)
        );
        assert_eq!(
            enrich_state("OPEN", true, false).await.state,
            Some(NotificationState::Draft)
        );
        assert_eq!(
            enrich_state("OPEN", false, true).await.state,
            Some(NotificationState::MergeQueue)
        );
        // Draft wins over merge queue.
        assert_eq!(
            enrich_state("OPEN", true, true).await.state,
            Some(NotificationState::Draft)
        );
    }

    #[tokio::test]
    async fn populates_reviews_and_linked_issues() {
        let details = enrich_state("OPEN", false, false).await;

        assert_eq!(details.linked_issues, Some(vec!["#789".to_owned()]));
        assert_eq!(
            details.reviews,
            Some(vec![PullRequestReview {
                state: ReviewState::Approved,
                users: vec!["reviewer1".to_owned()],
            }])
        );
        assert_eq!(details.user.map(|u| u.login), Some("pr-author".to_owned()));
        assert_eq!(
            details.html_url.as_deref(),
            Some("https://github.com/gitify-app/notifications-test/pull/123")
        );
        assert_eq!(details.comments, Some(0));
    }

    #[test]
    fn prefetched_node_resolves_presentation_state() {
        let details = PullRequestHandler
            .enrich_from_node(
                &notification(SubjectType::PullRequest),
                pull_node("OPEN", false, true),
                &SettingsState::default(),
            )
            .expect("enrich from node")
            .expect("details");

        assert_eq!(details.state, Some(NotificationState::MergeQueue));
        assert_eq!(details.linked_issues, Some(vec!["#789".to_owned()]));
    }

    #[test]
    fn latest_review_per_reviewer_grouped_by_state() {
        let reviews = [
            review("reviewer1", "CHANGES_REQUESTED"),
            review("reviewer2", "COMMENTED"),
            review("reviewer1", "APPROVED"),
            review("reviewer3", "APPROVED"),
        ];

        assert_eq!(
            latest_review_for_reviewers(&reviews),
            Some(vec![
                PullRequestReview {
                    state: ReviewState::Approved,
                    users: vec!["reviewer3".to_owned(), "reviewer1".to_owned()],
                },
                PullRequestReview {
                    state: ReviewState::Commented,
                    users: vec!["reviewer2".to_owned()],
                },
            ])
        );
    }

    #[test]
    fn no_reviews_yields_none() {
        assert_eq!(latest_review_for_reviewers(&[]), None);
    }

    #[test]
    fn icons_and_colors_follow_state() {
        let cases = [
            (Some(NotificationState::Draft), IconType::PullRequestDraft, IconColor::Gray),
            (Some(NotificationState::Closed), IconType::PullRequestClosed, IconColor::Red),
            (Some(NotificationState::MergeQueue), IconType::MergeQueue, IconColor::Yellow),
            (Some(NotificationState::Merged), IconType::Merge, IconColor::Purple),
            (Some(NotificationState::Open), IconType::PullRequest, IconColor::Green),
        ];

        for (state, icon, color) in cases {
            let mut subject = Subject::new(SubjectType::PullRequest, "x");
            subject.state = state;
            assert_eq!(PullRequestHandler.icon_type(&subject), icon);
            assert_eq!(PullRequestHandler.icon_color(&subject), color);
        }
    }

    #[test]
    fn default_url_points_at_pulls() {
        assert_eq!(
            PullRequestHandler.default_url(&notification(SubjectType::PullRequest)),
            "https://github.com/gitify-app/notifications-test/pulls"
        );
    }
}
