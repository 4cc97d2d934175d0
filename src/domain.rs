use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Domain data structures shared across modules.

/// A web URL that can be opened in a browser.
pub type Link = String;

/// Generates a string-backed enum whose unknown values are preserved in an
/// `Other` variant, so that new GitHub values never fail deserialization.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(value) => value.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($text => $name::$variant,)+
                    other => $name::Other(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name::from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_owned()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// The kind of GitHub entity a notification thread refers to.
    pub enum SubjectType {
        CheckSuite => "CheckSuite",
        Commit => "Commit",
        Discussion => "Discussion",
        Issue => "Issue",
        PullRequest => "PullRequest",
        Release => "Release",
        RepositoryDependabotAlertsThread => "RepositoryDependabotAlertsThread",
        RepositoryInvitation => "RepositoryInvitation",
        RepositoryVulnerabilityAlert => "RepositoryVulnerabilityAlert",
        WorkflowRun => "WorkflowRun",
    }
}

string_enum! {
    /// Why the authenticated user received a notification.
    pub enum Reason {
        ApprovalRequested => "approval_requested",
        Assign => "assign",
        Author => "author",
        CiActivity => "ci_activity",
        Comment => "comment",
        Invitation => "invitation",
        Manual => "manual",
        MemberFeatureRequested => "member_feature_requested",
        Mention => "mention",
        ReviewRequested => "review_requested",
        SecurityAdvisoryCredit => "security_advisory_credit",
        SecurityAlert => "security_alert",
        StateChange => "state_change",
        Subscribed => "subscribed",
        TeamMention => "team_mention",
    }
}

string_enum! {
    /// Granular subject state, as resolved by the per-type handlers.
    pub enum NotificationState {
        Open => "OPEN",
        Closed => "CLOSED",
        Merged => "MERGED",
        Draft => "DRAFT",
        MergeQueue => "MERGE_QUEUE",
        Reopened => "REOPENED",
        Completed => "COMPLETED",
        Duplicate => "DUPLICATE",
        NotPlanned => "NOT_PLANNED",
        Answered => "ANSWERED",
        Outdated => "OUTDATED",
        Resolved => "RESOLVED",
        Waiting => "WAITING",
        Cancelled => "CANCELLED",
        Failure => "FAILURE",
        Skipped => "SKIPPED",
        Success => "SUCCESS",
    }
}

string_enum! {
    /// GitHub actor kind; `__typename` in GraphQL, `type` in REST.
    pub enum UserType {
        User => "User",
        EnterpriseUserAccount => "EnterpriseUserAccount",
        Bot => "Bot",
        Organization => "Organization",
        Mannequin => "Mannequin",
    }
}

string_enum! {
    pub enum ReviewState {
        Approved => "APPROVED",
        ChangesRequested => "CHANGES_REQUESTED",
        Commented => "COMMENTED",
        Dismissed => "DISMISSED",
        Pending => "PENDING",
    }
}

/// Display title and optional description for a filterable value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeDetails {
    pub title: &'static str,
    pub description: Option<&'static str>,
}

/// A signed-in GitHub (cloud or Enterprise Server) account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub hostname: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub user: Option<AccountUser>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountUser {
    pub login: String,
    pub name: Option<String>,
}

impl Account {
    /// Stable identity used to match accounts across state updates.
    pub fn uuid(&self) -> String {
        format!("{}:{}", self.hostname, self.token)
    }

    pub fn web_url(&self) -> Link {
        format!("https://{}", self.hostname)
    }
}

/// A normalized author identity, whether it came from REST or GraphQL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUser {
    pub login: String,
    pub html_url: Link,
    pub avatar_url: Link,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub login: String,
    pub avatar_url: Link,
    #[serde(rename = "type")]
    pub owner_type: UserType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: Link,
    pub owner: Owner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub state: String,
    pub title: String,
}

/// Reviewers grouped under the state of their latest review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReview {
    pub state: ReviewState,
    pub users: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub title: String,
    pub url: Option<Link>,
    pub latest_comment_url: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NotificationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<NotificationUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<PullRequestReview>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<Link>,
}

impl Subject {
    pub fn new(subject_type: SubjectType, title: impl Into<String>) -> Self {
        Self {
            subject_type,
            title: title.into(),
            url: None,
            latest_comment_url: None,
            state: None,
            number: None,
            user: None,
            comments: None,
            labels: None,
            milestone: None,
            reviews: None,
            linked_issues: None,
            html_url: None,
        }
    }

    /// Overlays enrichment results. Only fields present in `details` overwrite;
    /// nothing is ever cleared.
    pub fn merge(&mut self, details: SubjectDetails) {
        fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        overlay(&mut self.state, details.state);
        overlay(&mut self.number, details.number);
        overlay(&mut self.user, details.user);
        overlay(&mut self.comments, details.comments);
        overlay(&mut self.labels, details.labels);
        overlay(&mut self.milestone, details.milestone);
        overlay(&mut self.reviews, details.reviews);
        overlay(&mut self.linked_issues, details.linked_issues);
        overlay(&mut self.html_url, details.html_url);
    }
}

/// The enrichable subset of [`Subject`] produced by a type handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectDetails {
    pub state: Option<NotificationState>,
    pub number: Option<u64>,
    pub user: Option<NotificationUser>,
    pub comments: Option<u64>,
    pub labels: Option<Vec<String>>,
    pub milestone: Option<Milestone>,
    pub reviews: Option<Vec<PullRequestReview>>,
    pub linked_issues: Option<Vec<String>>,
    pub html_url: Option<Link>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub unread: bool,
    pub reason: Reason,
    pub updated_at: DateTime<Utc>,
    pub subject: Subject,
    pub repository: Option<Repository>,
    #[serde(skip)]
    pub account: Arc<Account>,
    pub order: usize,
}

/// Coarse failure classification surfaced per account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    BadCredentials,
    MissingScopes,
    Network,
    RateLimited,
    Unknown,
}

impl FailureKind {
    pub fn title(&self) -> &'static str {
        match self {
            FailureKind::BadCredentials => "Bad credentials used",
            FailureKind::MissingScopes => "Missing API scopes",
            FailureKind::Network => "Unable to connect to GitHub",
            FailureKind::RateLimited => "GitHub API rate limit exceeded",
            FailureKind::Unknown => "Oops! Something went wrong",
        }
    }
}

/// Result of fetching one account. A current error may sit next to a
/// previously cached list of notifications.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountNotifications {
    pub account: Arc<Account>,
    pub notifications: Vec<Notification>,
    pub error: Option<FailureKind>,
}
