use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    header::{ACCEPT, LINK, USER_AGENT},
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::{
    domain::{
        Account, FailureKind, Notification, NotificationUser, Owner, Reason, Repository, Subject,
        SubjectType, UserType,
    },
    settings::SettingsState,
};

pub const GITHUB_CLOUD_HOSTNAME: &str = "github.com";
const USER_AGENT_HEADER: &str = "gh-inbox/0.1";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const NOTIFICATIONS_PER_PAGE: u32 = 50;

/// REST + GraphQL transport primitives the enrichment engine relies on.
///
/// Both calls return raw JSON; typed decoding happens in the callers so the
/// trait stays object safe and easy to fake in tests.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get(&self, url: &str, token: &str) -> Result<Value, FetchError>;

    /// Fetches every page of a list endpoint. Transports without pagination
    /// support return the single page behind `url`.
    async fn get_all(&self, url: &str, token: &str) -> Result<Vec<Value>, FetchError> {
        match self.get(url, token).await? {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }

    /// Runs a GraphQL document and returns its `data` object.
    async fn graphql(
        &self,
        hostname: &str,
        document: &str,
        variables: Value,
        token: &str,
    ) -> Result<Value, FetchError>;
}

pub fn is_enterprise_server_host(hostname: &str) -> bool {
    !hostname.ends_with(GITHUB_CLOUD_HOSTNAME)
}

pub fn api_base_url(hostname: &str) -> String {
    if is_enterprise_server_host(hostname) {
        format!("https://{hostname}/api/v3/")
    } else {
        format!("https://api.{GITHUB_CLOUD_HOSTNAME}/")
    }
}

pub fn graphql_url(hostname: &str) -> String {
    if is_enterprise_server_host(hostname) {
        format!("https://{hostname}/api/graphql")
    } else {
        format!("https://api.{GITHUB_CLOUD_HOSTNAME}/graphql")
    }
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_HEADER)
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self { client })
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(USER_AGENT, USER_AGENT_HEADER)
            .header(ACCEPT, GITHUB_ACCEPT)
            .bearer_auth(token)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(FetchError::Status {
            status,
            url: url.to_owned(),
            message,
        })
    }

    async fn thread_action(
        &self,
        method: Method,
        account: &Account,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), FetchError> {
        if account.token.is_empty() {
            return Err(FetchError::MissingToken);
        }

        let url = format!("{}{path}", api_base_url(&account.hostname));
        let mut request = self.request(method, &url, &account.token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request, &url).await?;
        Ok(())
    }

    /// Equivalent to opening the thread in the GitHub inbox.
    pub async fn mark_thread_read(
        &self,
        account: &Account,
        thread_id: &str,
    ) -> Result<(), FetchError> {
        self.thread_action(
            Method::PATCH,
            account,
            &format!("notifications/threads/{thread_id}"),
            None,
        )
        .await
    }

    /// Requires GitHub Enterprise Server 3.13 or later on self-hosted accounts.
    pub async fn mark_thread_done(
        &self,
        account: &Account,
        thread_id: &str,
    ) -> Result<(), FetchError> {
        self.thread_action(
            Method::DELETE,
            account,
            &format!("notifications/threads/{thread_id}"),
            None,
        )
        .await
    }

    pub async fn ignore_thread_subscription(
        &self,
        account: &Account,
        thread_id: &str,
    ) -> Result<(), FetchError> {
        self.thread_action(
            Method::PUT,
            account,
            &format!("notifications/threads/{thread_id}/subscription"),
            Some(json!({ "ignored": true })),
        )
        .await
    }
}

#[async_trait]
impl GitHubApi for HttpClient {
    async fn get(&self, url: &str, token: &str) -> Result<Value, FetchError> {
        if token.is_empty() {
            return Err(FetchError::MissingToken);
        }

        let response = self.send(self.request(Method::GET, url, token), url).await?;
        Ok(response.json().await?)
    }

    async fn get_all(&self, url: &str, token: &str) -> Result<Vec<Value>, FetchError> {
        if token.is_empty() {
            return Err(FetchError::MissingToken);
        }

        let mut items = Vec::new();
        let mut next = Some(url.to_owned());
        while let Some(page_url) = next.take() {
            debug!(url = %page_url, "fetching page");
            let response = self
                .send(self.request(Method::GET, &page_url, token), &page_url)
                .await?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page_url);

            match response.json::<Value>().await? {
                Value::Array(page) => items.extend(page),
                other => items.push(other),
            }
        }
        Ok(items)
    }

    async fn graphql(
        &self,
        hostname: &str,
        document: &str,
        variables: Value,
        token: &str,
    ) -> Result<Value, FetchError> {
        if token.is_empty() {
            return Err(FetchError::MissingToken);
        }

        let url = graphql_url(hostname);
        let request = self
            .request(Method::POST, &url, token)
            .json(&json!({ "query": document, "variables": variables }));
        let payload: GraphQlResponse = self.send(request, &url).await?.json().await?;

        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FetchError::GraphQl(message));
        }

        Ok(payload.data.unwrap_or(Value::Null))
    }
}

/// Extracts the `rel="next"` target from a `Link` response header.
fn next_page_url(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, rel) = part.split_once(';')?;
        if rel.trim() != r#"rel="next""# {
            return None;
        }
        Some(
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_owned(),
        )
    })
}

/// Lists the account's notification threads, most recently updated first.
pub async fn list_notifications(
    api: &dyn GitHubApi,
    account: &Arc<Account>,
    settings: &SettingsState,
) -> Result<Vec<Notification>, FetchError> {
    let url = format!(
        "{}notifications?participating={}&all={}&per_page={NOTIFICATIONS_PER_PAGE}",
        api_base_url(&account.hostname),
        settings.participating,
        settings.fetch_read_notifications,
    );

    let pages = if settings.fetch_all_notifications {
        api.get_all(&url, &account.token).await?
    } else {
        match api.get(&url, &account.token).await? {
            Value::Array(items) => items,
            other => vec![other],
        }
    };

    pages
        .into_iter()
        .map(|value| {
            let raw: NotificationResponse = serde_json::from_value(value)?;
            Ok(transform_notification(raw, account))
        })
        .collect()
}

pub async fn get_commit(
    api: &dyn GitHubApi,
    url: &str,
    token: &str,
) -> Result<CommitResponse, FetchError> {
    Ok(serde_json::from_value(api.get(url, token).await?)?)
}

pub async fn get_commit_comment(
    api: &dyn GitHubApi,
    url: &str,
    token: &str,
) -> Result<CommentResponse, FetchError> {
    Ok(serde_json::from_value(api.get(url, token).await?)?)
}

pub async fn get_release(
    api: &dyn GitHubApi,
    url: &str,
    token: &str,
) -> Result<ReleaseResponse, FetchError> {
    Ok(serde_json::from_value(api.get(url, token).await?)?)
}

/// Converts the REST payload into the domain notification. Enriched subject
/// fields start empty and `order` is assigned later by the stabilizer.
pub fn transform_notification(raw: NotificationResponse, account: &Arc<Account>) -> Notification {
    let mut subject = Subject::new(SubjectType::from(raw.subject.subject_type), raw.subject.title);
    subject.url = raw.subject.url;
    subject.latest_comment_url = raw.subject.latest_comment_url;

    Notification {
        id: raw.id,
        unread: raw.unread,
        reason: Reason::from(raw.reason),
        updated_at: raw.updated_at,
        subject,
        repository: raw.repository.map(|repo| Repository {
            name: repo.name,
            full_name: repo.full_name,
            html_url: repo.html_url,
            owner: Owner {
                login: repo.owner.login,
                avatar_url: repo.owner.avatar_url,
                owner_type: UserType::from(repo.owner.owner_type),
            },
        }),
        account: Arc::clone(account),
        order: 0,
    }
}

/// Parses the trailing issue/PR/discussion number out of a subject API URL.
pub fn subject_number(url: &str) -> Result<u64, FetchError> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| FetchError::InvalidSubjectUrl(url.to_owned()))
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API returned {status} for {url}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },
    #[error("Unexpected GitHub API payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("GraphQL request returned errors: {0}")]
    GraphQl(String),
    #[error("Account token is missing")]
    MissingToken,
    #[error("Notification subject has no API URL")]
    MissingSubjectUrl,
    #[error("Notification has no repository")]
    MissingRepository,
    #[error("Cannot derive a subject number from {0}")]
    InvalidSubjectUrl(String),
}

impl FetchError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            FetchError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                FailureKind::BadCredentials
            }
            FetchError::Status {
                status, message, ..
            } if *status == StatusCode::FORBIDDEN => {
                if message.contains("Missing the 'notifications' scope") {
                    FailureKind::MissingScopes
                } else if message.contains("API rate limit exceeded")
                    || message.contains("You have exceeded a secondary rate limit")
                {
                    FailureKind::RateLimited
                } else {
                    FailureKind::Unknown
                }
            }
            FetchError::Http(err) if err.is_connect() || err.is_timeout() => FailureKind::Network,
            FetchError::MissingToken => FailureKind::BadCredentials,
            _ => FailureKind::Unknown,
        }
    }
}

// Response payloads ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationResponse {
    id: String,
    reason: String,
    updated_at: DateTime<Utc>,
    unread: bool,
    subject: NotificationSubject,
    repository: Option<NotificationRepository>,
}

#[derive(Debug, Deserialize)]
struct NotificationSubject {
    title: String,
    url: Option<String>,
    latest_comment_url: Option<String>,
    #[serde(rename = "type")]
    subject_type: String,
}

#[derive(Debug, Deserialize)]
struct NotificationRepository {
    name: String,
    full_name: String,
    html_url: String,
    owner: NotificationOwner,
}

#[derive(Debug, Deserialize)]
struct NotificationOwner {
    login: String,
    avatar_url: String,
    #[serde(rename = "type")]
    owner_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RestUser {
    pub login: String,
    pub html_url: String,
    pub avatar_url: String,
    #[serde(rename = "type")]
    pub user_type: String,
}

impl From<RestUser> for NotificationUser {
    fn from(user: RestUser) -> Self {
        NotificationUser {
            login: user.login,
            html_url: user.html_url,
            avatar_url: user.avatar_url,
            user_type: UserType::from(user.user_type),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommitResponse {
    pub html_url: Option<String>,
    pub author: Option<RestUser>,
}

#[derive(Debug, Deserialize)]
pub struct CommentResponse {
    pub html_url: Option<String>,
    pub user: Option<RestUser>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseResponse {
    pub html_url: Option<String>,
    pub author: Option<RestUser>,
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApi, account};

    #[test]
    fn api_urls_distinguish_cloud_and_enterprise() {
        assert_eq!(api_base_url("github.com"), "https://api.github.com/");
        assert_eq!(graphql_url("github.com"), "https://api.github.com/graphql");
        assert_eq!(
            api_base_url("github.gitify.io"),
            "https://github.gitify.io/api/v3/"
        );
        assert_eq!(
            graphql_url("github.gitify.io"),
            "https://github.gitify.io/api/graphql"
        );
    }

    #[test]
    fn subject_number_reads_trailing_segment() {
        assert_eq!(
            subject_number("https://api.github.com/repos/acme/widgets/issues/42").ok(),
            Some(42)
        );
        assert!(matches!(
            subject_number("https://api.github.com/repos/acme/widgets/releases/latest"),
            Err(FetchError::InvalidSubjectUrl(_))
        ));
    }

    #[test]
    fn next_page_url_follows_rel_next() {
        let header = r#"<https://api.github.com/notifications?page=2>; rel="next", <https://api.github.com/notifications?page=5>; rel="last""#;
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://api.github.com/notifications?page=2")
        );
        assert_eq!(
            next_page_url(r#"<https://api.github.com/notifications?page=1>; rel="prev""#),
            None
        );
    }

    #[test]
    fn failure_kind_classifies_status_codes() {
        let unauthorized = FetchError::Status {
            status: StatusCode::UNAUTHORIZED,
            url: "u".into(),
            message: String::new(),
        };
        assert_eq!(unauthorized.failure_kind(), FailureKind::BadCredentials);

        let rate_limited = FetchError::Status {
            status: StatusCode::FORBIDDEN,
            url: "u".into(),
            message: "API rate limit exceeded for user".into(),
        };
        assert_eq!(rate_limited.failure_kind(), FailureKind::RateLimited);

        let scopes = FetchError::Status {
            status: StatusCode::FORBIDDEN,
            url: "u".into(),
            message: "Missing the 'notifications' scope".into(),
        };
        assert_eq!(scopes.failure_kind(), FailureKind::MissingScopes);

        assert_eq!(
            FetchError::GraphQl("boom".into()).failure_kind(),
            FailureKind::Unknown
        );
    }

    #[tokio::test]
    async fn list_notifications_transforms_payload() {
        let api = MockApi::new().with_get(
            "notifications",
            json!([{
                "id": "138661096",
                "reason": "subscribed",
                "unread": true,
                "updated_at": "2024-05-20T17:06:34Z",
                "subject": {
                    "title": "Improve startup time",
                    "url": "https://api.github.com/repos/acme/widgets/issues/1",
                    "latest_comment_url": null,
                    "type": "Issue"
                },
                "repository": {
                    "name": "widgets",
                    "full_name": "acme/widgets",
                    "html_url": "https://github.com/acme/widgets",
                    "owner": {
                        "login": "acme",
                        "avatar_url": "https://avatars.githubusercontent.com/u/1",
                        "type": "Organization"
                    }
                }
            }]),
        );
        let account = Arc::new(account());

        let notifications = list_notifications(&api, &account, &SettingsState::default())
            .await
            .expect("list");

        assert_eq!(notifications.len(), 1);
        let notification = &notifications[0];
        assert_eq!(notification.reason, Reason::Subscribed);
        assert_eq!(notification.subject.subject_type, SubjectType::Issue);
        assert_eq!(notification.order, 0);
        let repository = notification.repository.as_ref().expect("repository");
        assert_eq!(repository.full_name, "acme/widgets");
        assert_eq!(repository.owner.owner_type, UserType::Organization);
        assert!(Arc::ptr_eq(&notification.account, &account));
    }

    #[tokio::test]
    async fn thread_actions_require_token() {
        let client = HttpClient::new().expect("client");
        let profile = Account {
            hostname: "github.com".into(),
            token: String::new(),
            user: None,
        };
        let result = client.mark_thread_read(&profile, "thread123").await;
        assert!(matches!(result, Err(FetchError::MissingToken)));
    }
}
