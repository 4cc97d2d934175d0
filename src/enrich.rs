// Runs the per-type handler for every notification and overlays whatever it
// returns onto the subject. A failing handler never fails the batch.

use std::collections::HashMap;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    domain::Notification,
    github::GitHubApi,
    graphql,
    handlers::handler_for,
    settings::SettingsState,
};

/// Identity when detailed notifications are disabled; no request is made.
/// Otherwise issue, pull request and discussion details are fetched in one
/// batched query per account, the rest are enriched one by one, and the
/// output keeps the input order.
pub async fn enrich_notifications(
    api: &dyn GitHubApi,
    notifications: Vec<Notification>,
    settings: &SettingsState,
) -> Vec<Notification> {
    if !settings.detailed_notifications {
        return notifications;
    }

    let mut nodes = prefetch_merged_nodes(api, &notifications).await;

    join_all(
        notifications
            .into_iter()
            .enumerate()
            .map(|(index, notification)| {
                let node = nodes.remove(&index);
                enrich_with_node(api, notification, node, settings)
            }),
    )
    .await
}

pub async fn enrich_notification(
    api: &dyn GitHubApi,
    notification: Notification,
    settings: &SettingsState,
) -> Notification {
    enrich_with_node(api, notification, None, settings).await
}

// Notifications missing from the result fall back to their own lookup.
async fn prefetch_merged_nodes(
    api: &dyn GitHubApi,
    notifications: &[Notification],
) -> HashMap<usize, Value> {
    let mut batches: IndexMap<String, Vec<(usize, &Notification)>> = IndexMap::new();
    for (index, notification) in notifications.iter().enumerate() {
        let handler = handler_for(&notification.subject.subject_type);
        if handler.supports_merged_query_enrichment() && graphql::is_locatable(notification) {
            batches
                .entry(notification.account.uuid())
                .or_default()
                .push((index, notification));
        }
    }

    let fetched = join_all(batches.into_values().map(|batch| async move {
        let (indices, members): (Vec<usize>, Vec<&Notification>) = batch.into_iter().unzip();
        let hostname = members
            .first()
            .map(|notification| notification.account.hostname.as_str())
            .unwrap_or_default();

        match graphql::fetch_merged_details(api, &members).await {
            Ok(nodes) => {
                debug!(account = hostname, notifications = nodes.len(), "fetched merged details");
                indices.into_iter().zip(nodes).collect::<Vec<(usize, Value)>>()
            }
            Err(err) => {
                error!(
                    account = hostname,
                    notifications = indices.len(),
                    error = %err,
                    "failed to fetch merged notification details"
                );
                warn!("falling back to per-notification enrichment");
                Vec::new()
            }
        }
    }))
    .await;

    fetched.into_iter().flatten().collect()
}

async fn enrich_with_node(
    api: &dyn GitHubApi,
    mut notification: Notification,
    node: Option<Value>,
    settings: &SettingsState,
) -> Notification {
    let handler = handler_for(&notification.subject.subject_type);

    let result = match node {
        Some(node) => handler.enrich_from_node(&notification, node, settings),
        None => handler.enrich(api, &notification, settings).await,
    };

    match result {
        Ok(Some(details)) => notification.subject.merge(details),
        Ok(None) => {}
        Err(err) => {
            error!(
                notification_id = %notification.id,
                subject_type = %notification.subject.subject_type,
                repository = notification.repository.as_ref().map(|repo| repo.full_name.as_str()),
                error = %err,
                "failed to enrich notification details"
            );
            warn!("continuing with base notification details");
        }
    }

    notification
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        domain::{NotificationState, SubjectType},
        graphql::MERGED_QUERY_NAME,
        test_support::{MockApi, enterprise_account, notification},
    };

    fn issue_node(number: u64) -> Value {
        json!({
            "number": number,
            "url": format!("https://github.com/gitify-app/notifications-test/issues/{number}"),
            "state": "OPEN",
            "stateReason": null,
            "author": {
                "login": "octocat",
                "url": "https://github.com/octocat",
                "avatarUrl": "https://avatars.githubusercontent.com/octocat",
                "__typename": "User"
            },
            "comments": { "totalCount": 0, "nodes": [] },
            "labels": { "nodes": [] },
            "milestone": null
        })
    }

    fn issue_data() -> Value {
        json!({ "repository": { "issue": issue_node(1) } })
    }

    fn merged_issues(count: usize) -> Value {
        let nodes: serde_json::Map<String, Value> = (0..count)
            .map(|index| (format!("node{index}"), json!({ "issue": issue_node(index as u64 + 1) })))
            .collect();
        Value::Object(nodes)
    }

    fn issues(count: usize) -> Vec<Notification> {
        (0..count)
            .map(|index| {
                let mut issue = notification(SubjectType::Issue);
                issue.id = index.to_string();
                issue.subject.url = Some(format!(
                    "https://api.github.com/repos/gitify-app/notifications-test/issues/{}",
                    index + 1
                ));
                issue
            })
            .collect()
    }

    #[tokio::test]
    async fn disabled_details_is_identity_without_requests() {
        let api = MockApi::new().with_graphql("FetchIssueByNumber", issue_data());
        let settings = SettingsState {
            detailed_notifications: false,
            ..SettingsState::default()
        };
        let input = vec![notification(SubjectType::Issue), notification(SubjectType::Commit)];

        let output = enrich_notifications(&api, input.clone(), &settings).await;

        assert_eq!(output, input);
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn merges_handler_details() {
        let api = MockApi::new().with_graphql(MERGED_QUERY_NAME, merged_issues(1));

        let output = enrich_notifications(
            &api,
            vec![notification(SubjectType::Issue)],
            &SettingsState::default(),
        )
        .await;

        let subject = &output[0].subject;
        assert_eq!(subject.state, Some(NotificationState::Open));
        assert_eq!(subject.number, Some(1));
        assert_eq!(subject.user.as_ref().map(|u| u.login.as_str()), Some("octocat"));
        assert_eq!(subject.title, "This is a notification.");
    }

    #[tokio::test]
    async fn graphql_types_share_one_request_per_account() {
        let api = MockApi::new().with_graphql(MERGED_QUERY_NAME, merged_issues(5));

        let output = enrich_notifications(&api, issues(5), &SettingsState::default()).await;

        assert_eq!(api.graphql_calls(), 1);
        let numbers: Vec<Option<u64>> = output.iter().map(|n| n.subject.number).collect();
        assert_eq!(numbers, [Some(1), Some(2), Some(3), Some(4), Some(5)]);
        let ids: Vec<&str> = output.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn accounts_are_batched_separately() {
        let api = MockApi::new().with_graphql(MERGED_QUERY_NAME, merged_issues(2));
        let mut input = issues(4);
        for issue in &mut input[2..] {
            issue.account = Arc::new(enterprise_account());
        }

        let output = enrich_notifications(&api, input, &SettingsState::default()).await;

        assert_eq!(api.graphql_calls(), 2);
        assert!(output.iter().all(|n| n.subject.state == Some(NotificationState::Open)));
    }

    #[tokio::test]
    async fn failed_batch_falls_back_to_single_lookups() {
        let api = MockApi::new().with_graphql("FetchIssueByNumber", issue_data());

        let output = enrich_notifications(&api, issues(2), &SettingsState::default()).await;

        assert_eq!(api.graphql_calls(), 3);
        assert!(output.iter().all(|n| n.subject.state == Some(NotificationState::Open)));
    }

    #[tokio::test]
    async fn missing_batched_entity_is_not_refetched() {
        let api = MockApi::new()
            .with_graphql(MERGED_QUERY_NAME, json!({ "node0": { "issue": null } }))
            .with_graphql("FetchIssueByNumber", issue_data());
        let input = issues(1);

        let output = enrich_notifications(&api, input.clone(), &SettingsState::default()).await;

        assert_eq!(output, input);
        assert_eq!(api.graphql_calls(), 1);
    }

    #[tokio::test]
    async fn failures_keep_the_base_subject() {
        // Neither the batch nor the pull request lookup is served.
        let api = MockApi::new().with_graphql("FetchIssueByNumber", issue_data());
        let mut pr = notification(SubjectType::PullRequest);
        pr.id = "2".into();
        let input = vec![notification(SubjectType::Issue), pr.clone()];

        let output = enrich_notifications(&api, input, &SettingsState::default()).await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].subject.state, Some(NotificationState::Open));
        assert_eq!(output[1], pr);
    }

    #[tokio::test]
    async fn types_without_remote_data_pass_through() {
        let api = MockApi::new();
        let mut alert = notification(SubjectType::RepositoryDependabotAlertsThread);
        alert.subject.title = "Dependabot alert".into();

        let output = enrich_notification(&api, alert.clone(), &SettingsState::default()).await;

        assert_eq!(output, alert);
        assert_eq!(api.total_calls(), 0);
    }
}
