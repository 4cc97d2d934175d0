// Typed GraphQL lookups for the subject types that support them. A `null`
// entity (deleted or inaccessible) decodes to `Ok(None)`.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::{
    domain::{Milestone, Notification, NotificationUser, SubjectType, UserType},
    github::{self, FetchError, GitHubApi},
};

const FIRST_LABELS: u32 = 100;
const FIRST_CLOSING_ISSUES: u32 = 100;
const LAST_COMMENTS: u32 = 1;
const LAST_THREADED_COMMENTS: u32 = 10;
const LAST_REPLIES: u32 = 10;
const LAST_REVIEWS: u32 = 100;

const AUTHOR_FIELDS: &str = r#"
fragment AuthorFields on Actor {
  login
  url
  avatarUrl
  __typename
}
"#;

const ISSUE_DETAILS_FIELDS: &str = r#"
fragment IssueDetailsFields on Issue {
  number
  url
  state
  stateReason
  author { ...AuthorFields }
  comments(last: $lastComments) {
    totalCount
    nodes { url author { ...AuthorFields } }
  }
  labels(first: $firstLabels) { nodes { name } }
  milestone { state title }
}
"#;

const PULL_REQUEST_DETAILS_FIELDS: &str = r#"
fragment PullRequestDetailsFields on PullRequest {
  number
  url
  state
  isDraft
  isInMergeQueue
  author { ...AuthorFields }
  comments(last: $lastComments) {
    totalCount
    nodes { url author { ...AuthorFields } }
  }
  reviews(last: $lastReviews) {
    totalCount
    nodes { state author { login } }
  }
  labels(first: $firstLabels) { nodes { name } }
  closingIssuesReferences(first: $firstClosingIssues) { nodes { number } }
  milestone { state title }
}
"#;

const DISCUSSION_DETAILS_FIELDS: &str = r#"
fragment DiscussionDetailsFields on Discussion {
  number
  url
  stateReason
  isAnswered @include(if: $includeIsAnswered)
  author { ...AuthorFields }
  comments(last: $lastThreadedComments) {
    totalCount
    nodes {
      createdAt
      url
      author { ...AuthorFields }
      replies(last: $lastReplies) {
        nodes { createdAt url author { ...AuthorFields } }
      }
    }
  }
  labels(first: $firstLabels) { nodes { name } }
}
"#;

pub const FETCH_ISSUE_BY_NUMBER: &str = r#"
query FetchIssueByNumber(
  $owner: String!, $name: String!, $number: Int!, $lastComments: Int, $firstLabels: Int
) {
  repository(owner: $owner, name: $name) {
    issue(number: $number) { ...IssueDetailsFields }
  }
}
"#;

pub const FETCH_PULL_BY_NUMBER: &str = r#"
query FetchPullByNumber(
  $owner: String!, $name: String!, $number: Int!, $lastComments: Int, $lastReviews: Int,
  $firstLabels: Int, $firstClosingIssues: Int
) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) { ...PullRequestDetailsFields }
  }
}
"#;

pub const FETCH_DISCUSSION_BY_NUMBER: &str = r#"
query FetchDiscussionByNumber(
  $owner: String!, $name: String!, $number: Int!, $lastThreadedComments: Int,
  $lastReplies: Int, $firstLabels: Int, $includeIsAnswered: Boolean!
) {
  repository(owner: $owner, name: $name) {
    discussion(number: $number) { ...DiscussionDetailsFields }
  }
}
"#;

pub const MERGED_QUERY_NAME: &str = "FetchMergedNotificationDetails";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorFields {
    pub login: String,
    pub url: String,
    pub avatar_url: String,
    #[serde(rename = "__typename")]
    pub typename: String,
}

impl From<AuthorFields> for NotificationUser {
    fn from(author: AuthorFields) -> Self {
        NotificationUser {
            login: author.login,
            html_url: author.url,
            avatar_url: author.avatar_url,
            user_type: UserType::from(author.typename),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            nodes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Comment {
    pub url: String,
    pub author: Option<AuthorFields>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetails {
    pub number: u64,
    pub url: String,
    pub state: String,
    pub state_reason: Option<String>,
    pub author: Option<AuthorFields>,
    #[serde(default)]
    pub comments: Connection<Comment>,
    #[serde(default)]
    pub labels: Option<Connection<Label>>,
    pub milestone: Option<Milestone>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewAuthor {
    pub login: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequestReviewFields {
    pub state: String,
    pub author: Option<ReviewAuthor>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClosingIssue {
    pub number: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestDetails {
    pub number: u64,
    pub url: String,
    pub state: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub is_in_merge_queue: bool,
    pub author: Option<AuthorFields>,
    #[serde(default)]
    pub comments: Connection<Comment>,
    #[serde(default)]
    pub reviews: Connection<PullRequestReviewFields>,
    #[serde(default)]
    pub labels: Option<Connection<Label>>,
    #[serde(default)]
    pub closing_issues_references: Option<Connection<ClosingIssue>>,
    pub milestone: Option<Milestone>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionComment {
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub author: Option<AuthorFields>,
    #[serde(default)]
    pub replies: Option<Connection<DiscussionComment>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionDetails {
    pub number: u64,
    pub url: String,
    pub state_reason: Option<String>,
    #[serde(default)]
    pub is_answered: Option<bool>,
    pub author: Option<AuthorFields>,
    #[serde(default)]
    pub comments: Connection<DiscussionComment>,
    #[serde(default)]
    pub labels: Option<Connection<Label>>,
}

pub async fn fetch_issue_by_number(
    api: &dyn GitHubApi,
    notification: &Notification,
) -> Result<Option<IssueDetails>, FetchError> {
    fetch_by_number(
        api,
        notification,
        FETCH_ISSUE_BY_NUMBER,
        ISSUE_DETAILS_FIELDS,
        "issue",
        json!({ "lastComments": LAST_COMMENTS, "firstLabels": FIRST_LABELS }),
    )
    .await
}

pub async fn fetch_pull_by_number(
    api: &dyn GitHubApi,
    notification: &Notification,
) -> Result<Option<PullRequestDetails>, FetchError> {
    fetch_by_number(
        api,
        notification,
        FETCH_PULL_BY_NUMBER,
        PULL_REQUEST_DETAILS_FIELDS,
        "pullRequest",
        json!({
            "lastComments": LAST_COMMENTS,
            "lastReviews": LAST_REVIEWS,
            "firstLabels": FIRST_LABELS,
            "firstClosingIssues": FIRST_CLOSING_ISSUES,
        }),
    )
    .await
}

pub async fn fetch_discussion_by_number(
    api: &dyn GitHubApi,
    notification: &Notification,
) -> Result<Option<DiscussionDetails>, FetchError> {
    let include_is_answered = include_is_answered(&notification.account.hostname);
    fetch_by_number(
        api,
        notification,
        FETCH_DISCUSSION_BY_NUMBER,
        DISCUSSION_DETAILS_FIELDS,
        "discussion",
        json!({
            "lastThreadedComments": LAST_THREADED_COMMENTS,
            "lastReplies": LAST_REPLIES,
            "firstLabels": FIRST_LABELS,
            "includeIsAnswered": include_is_answered,
        }),
    )
    .await
}

// Enterprise Server versions vary in `isAnswered` support.
fn include_is_answered(hostname: &str) -> bool {
    !github::is_enterprise_server_host(hostname)
}

/// Repository coordinates and number of the entity a notification points at.
struct EntityLocator<'a> {
    owner: &'a str,
    name: &'a str,
    number: u64,
}

fn locate(notification: &Notification) -> Result<EntityLocator<'_>, FetchError> {
    let url = notification
        .subject
        .url
        .as_deref()
        .ok_or(FetchError::MissingSubjectUrl)?;
    let repository = notification
        .repository
        .as_ref()
        .ok_or(FetchError::MissingRepository)?;

    Ok(EntityLocator {
        owner: &repository.owner.login,
        name: &repository.name,
        number: github::subject_number(url)?,
    })
}

/// Whether the notification carries enough to be looked up by number.
pub fn is_locatable(notification: &Notification) -> bool {
    locate(notification).is_ok()
}

/// Decodes one entity node; `null` means the entity is gone.
pub fn decode_node<T: DeserializeOwned>(node: Value) -> Result<Option<T>, FetchError> {
    if node.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(node)?))
}

async fn fetch_by_number<T: DeserializeOwned>(
    api: &dyn GitHubApi,
    notification: &Notification,
    query: &str,
    fragment: &str,
    entity: &str,
    mut variables: Value,
) -> Result<Option<T>, FetchError> {
    let locator = locate(notification)?;

    if let Value::Object(map) = &mut variables {
        map.insert("owner".into(), json!(locator.owner));
        map.insert("name".into(), json!(locator.name));
        map.insert("number".into(), json!(locator.number));
    }

    let document = format!("{query}{fragment}{AUTHOR_FIELDS}");
    let data = api
        .graphql(
            &notification.account.hostname,
            &document,
            variables,
            &notification.account.token,
        )
        .await?;

    let node = data
        .get("repository")
        .and_then(|repository| repository.get(entity))
        .cloned()
        .unwrap_or(Value::Null);
    decode_node(node)
}

/// Fetches issue, pull request and discussion details for many
/// notifications of one account in a single aliased query. Returns one node
/// per input notification, in input order; `Value::Null` where the entity is
/// missing.
pub async fn fetch_merged_details(
    api: &dyn GitHubApi,
    notifications: &[&Notification],
) -> Result<Vec<Value>, FetchError> {
    let Some(first) = notifications.first() else {
        return Ok(Vec::new());
    };

    let mut definitions = vec![
        "$lastComments: Int, $lastThreadedComments: Int, $lastReplies: Int, $lastReviews: Int, \
         $firstLabels: Int, $firstClosingIssues: Int, $includeIsAnswered: Boolean!"
            .to_owned(),
    ];
    let mut selections = String::new();
    let mut variables = Map::new();
    variables.insert("lastComments".into(), json!(LAST_COMMENTS));
    variables.insert("lastThreadedComments".into(), json!(LAST_THREADED_COMMENTS));
    variables.insert("lastReplies".into(), json!(LAST_REPLIES));
    variables.insert("lastReviews".into(), json!(LAST_REVIEWS));
    variables.insert("firstLabels".into(), json!(FIRST_LABELS));
    variables.insert("firstClosingIssues".into(), json!(FIRST_CLOSING_ISSUES));
    variables.insert(
        "includeIsAnswered".into(),
        json!(include_is_answered(&first.account.hostname)),
    );

    for (index, notification) in notifications.iter().enumerate() {
        let locator = locate(notification)?;
        let subject_type = &notification.subject.subject_type;

        definitions.push(format!(
            "$owner{index}: String!, $name{index}: String!, $number{index}: Int!, \
             $isIssueNotification{index}: Boolean!, $isPullRequestNotification{index}: Boolean!, \
             $isDiscussionNotification{index}: Boolean!"
        ));
        let _ = write!(
            selections,
            "  node{index}: repository(owner: $owner{index}, name: $name{index}) {{\n    \
             issue(number: $number{index}) @include(if: $isIssueNotification{index}) \
             {{ ...IssueDetailsFields }}\n    \
             pullRequest(number: $number{index}) @include(if: $isPullRequestNotification{index}) \
             {{ ...PullRequestDetailsFields }}\n    \
             discussion(number: $number{index}) @include(if: $isDiscussionNotification{index}) \
             {{ ...DiscussionDetailsFields }}\n  }}\n"
        );

        variables.insert(format!("owner{index}"), json!(locator.owner));
        variables.insert(format!("name{index}"), json!(locator.name));
        variables.insert(format!("number{index}"), json!(locator.number));
        variables.insert(
            format!("isIssueNotification{index}"),
            json!(*subject_type == SubjectType::Issue),
        );
        variables.insert(
            format!("isPullRequestNotification{index}"),
            json!(*subject_type == SubjectType::PullRequest),
        );
        variables.insert(
            format!("isDiscussionNotification{index}"),
            json!(*subject_type == SubjectType::Discussion),
        );
    }

    let document = format!(
        "query {MERGED_QUERY_NAME}({}) {{\n{selections}}}\n\
         {ISSUE_DETAILS_FIELDS}{PULL_REQUEST_DETAILS_FIELDS}\
         {DISCUSSION_DETAILS_FIELDS}{AUTHOR_FIELDS}",
        definitions.join(", ")
    );
    let data = api
        .graphql(
            &first.account.hostname,
            &document,
            Value::Object(variables),
            &first.account.token,
        )
        .await?;

    Ok((0..notifications.len())
        .map(|index| merged_node(&data, index))
        .collect())
}

// Only the included entity field is present under each alias.
fn merged_node(data: &Value, index: usize) -> Value {
    data.get(format!("node{index}"))
        .and_then(Value::as_object)
        .and_then(|repository| repository.values().find(|value| !value.is_null()))
        .cloned()
        .unwrap_or(Value::Null)
}
