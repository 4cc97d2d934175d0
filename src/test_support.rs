// Fixtures and a fake transport shared by the unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;

use crate::{
    domain::{
        Account, Notification, NotificationUser, Owner, Reason, Repository, Subject, SubjectType,
        UserType,
    },
    github::{FetchError, GitHubApi},
};

pub const UPDATED_AT: &str = "2024-05-20T17:06:34Z";

/// Serves canned JSON keyed by a URL fragment (REST) or operation name
/// (GraphQL). Anything unmatched fails with a 404.
#[derive(Default)]
pub struct MockApi {
    gets: Vec<(String, Value)>,
    graphql: Vec<(String, Value)>,
    get_calls: AtomicUsize,
    graphql_calls: AtomicUsize,
    last_variables: Mutex<Option<Value>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(mut self, url_fragment: &str, body: Value) -> Self {
        self.gets.push((url_fragment.to_owned(), body));
        self
    }

    pub fn with_graphql(mut self, operation: &str, data: Value) -> Self {
        self.graphql.push((operation.to_owned(), data));
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn graphql_calls(&self) -> usize {
        self.graphql_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.graphql_calls()
    }

    pub fn last_graphql_variables(&self) -> Option<Value> {
        self.last_variables.lock().ok().and_then(|guard| guard.clone())
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            status: StatusCode::NOT_FOUND,
            url: url.to_owned(),
            message: "Not Found".to_owned(),
        }
    }
}

#[async_trait]
impl GitHubApi for MockApi {
    async fn get(&self, url: &str, _token: &str) -> Result<Value, FetchError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.gets
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| Self::not_found(url))
    }

    async fn graphql(
        &self,
        _hostname: &str,
        document: &str,
        variables: Value,
        _token: &str,
    ) -> Result<Value, FetchError> {
        self.graphql_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_variables.lock() {
            *last = Some(variables);
        }
        self.graphql
            .iter()
            .find(|(operation, _)| document.contains(operation.as_str()))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Self::not_found("graphql"))
    }
}

pub fn account() -> Account {
    Account {
        hostname: "github.com".into(),
        token: "token-123".into(),
        user: None,
    }
}

pub fn enterprise_account() -> Account {
    Account {
        hostname: "github.gitify.io".into(),
        token: "token-456".into(),
        user: None,
    }
}

pub fn timestamp(value: &str) -> DateTime<Utc> {
    value.parse().expect("valid RFC 3339 timestamp")
}

pub fn repository(full_name: &str) -> Repository {
    let (owner, name) = full_name.split_once('/').unwrap_or(("gitify-app", full_name));
    Repository {
        name: name.to_owned(),
        full_name: full_name.to_owned(),
        html_url: format!("https://github.com/{full_name}"),
        owner: Owner {
            login: owner.to_owned(),
            avatar_url: "https://avatars.githubusercontent.com/u/133795385".into(),
            owner_type: UserType::Organization,
        },
    }
}

pub fn user(login: &str, user_type: UserType) -> NotificationUser {
    NotificationUser {
        login: login.to_owned(),
        html_url: format!("https://github.com/{login}"),
        avatar_url: format!("https://avatars.githubusercontent.com/{login}"),
        user_type,
    }
}

pub fn notification(subject_type: SubjectType) -> Notification {
    let api_path = match subject_type {
        SubjectType::Issue => "issues/1",
        SubjectType::PullRequest => "pulls/1",
        SubjectType::Discussion => "discussions/1",
        SubjectType::Commit => "commits/d2a86d80e3d24ea9510d5de6c147e53c30f313a8",
        SubjectType::Release => "releases/1",
        _ => "",
    };

    let mut subject = Subject::new(subject_type, "This is a notification.");
    if !api_path.is_empty() {
        subject.url = Some(format!(
            "https://api.github.com/repos/gitify-app/notifications-test/{api_path}"
        ));
    }

    Notification {
        id: "138661096".into(),
        unread: true,
        reason: Reason::Subscribed,
        updated_at: timestamp(UPDATED_AT),
        subject,
        repository: Some(repository("gitify-app/notifications-test")),
        account: Arc::new(account()),
        order: 0,
    }
}

pub fn notification_for_repo(id: &str, full_name: Option<&str>) -> Notification {
    let mut notification = notification(SubjectType::Issue);
    notification.id = id.to_owned();
    notification.repository = full_name.map(repository);
    notification
}
