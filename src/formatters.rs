use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::{
    domain::{Notification, UserType},
    handlers::{IconColor, IconType, handler_for},
};

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid camel case pattern"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// UI-ready values for one enriched notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDisplay {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub number: String,
    pub title: String,
    pub icon_type: IconType,
    pub icon_color: IconColor,
    pub default_user_type: UserType,
}

/// Must run after enrichment; the output depends on the resolved state and
/// number.
pub fn format_notification(notification: &Notification) -> NotificationDisplay {
    let handler = handler_for(&notification.subject.subject_type);

    NotificationDisplay {
        notification_type: formatted_notification_type(notification),
        number: formatted_notification_number(notification),
        title: formatted_notification_title(notification),
        icon_type: handler.icon_type(&notification.subject),
        icon_color: handler.icon_color(&notification.subject),
        default_user_type: handler.default_user_type(),
    }
}

/// Joins the words, splits camelCase, turns underscores into spaces and
/// title-cases every word: `["NOT_PLANNED", "PullRequest"]` becomes
/// `"Not Planned Pull Request"`.
pub fn format_for_display(words: &[&str]) -> String {
    let joined = words.join(" ");
    let spaced = CAMEL_BOUNDARY.replace_all(&joined, "$1 $2").replace('_', " ");

    WORD.replace_all(&spaced, |captures: &Captures<'_>| {
        let word = &captures[0];
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
    .trim()
    .to_owned()
}

pub fn formatted_notification_type(notification: &Notification) -> String {
    let subject = &notification.subject;
    let words: Vec<&str> = subject
        .state
        .as_ref()
        .map(|state| state.as_str())
        .into_iter()
        .chain([subject.subject_type.as_str()])
        .collect();

    format_for_display(&words)
}

pub fn format_github_number(number: u64) -> String {
    format!("#{number}")
}

pub fn formatted_notification_number(notification: &Notification) -> String {
    notification
        .subject
        .number
        .filter(|number| *number > 0)
        .map(format_github_number)
        .unwrap_or_default()
}

pub fn formatted_notification_title(notification: &Notification) -> String {
    let number = formatted_notification_number(notification);
    if number.is_empty() {
        notification.subject.title.clone()
    } else {
        format!("{} [{number}]", notification.subject.title)
    }
}

/// `"1 comment"`, `"3 comments"`, or empty for zero.
pub fn format_metric_description(count: u64, singular: &str) -> String {
    match count {
        0 => String::new(),
        1 => format!("{count} {singular}"),
        _ => format!("{count} {singular}s"),
    }
}
