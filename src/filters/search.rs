use crate::{
    domain::{Notification, NotificationUser},
    settings::SettingsState,
};

/// Recognized `<qualifier>:<value>` search prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchQualifier {
    Author,
    Org,
    Repo,
}

impl SearchQualifier {
    pub const ALL: [SearchQualifier; 3] = [
        SearchQualifier::Author,
        SearchQualifier::Org,
        SearchQualifier::Repo,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            SearchQualifier::Author => "author:",
            SearchQualifier::Org => "org:",
            SearchQualifier::Repo => "repo:",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SearchQualifier::Author => "filter by notification author",
            SearchQualifier::Org => "filter by organization owner",
            SearchQualifier::Repo => "filter by repository full name",
        }
    }

    /// `author:` needs the enriched subject user.
    pub fn requires_detailed_notifications(&self) -> bool {
        matches!(self, SearchQualifier::Author)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSearchToken {
    pub qualifier: SearchQualifier,
    pub value: String,
}

/// Parses a single search token. The qualifier must start the token and the
/// value must be non-empty.
pub fn parse_search_input(raw: &str) -> Option<ParsedSearchToken> {
    let token = raw.trim();
    SearchQualifier::ALL.into_iter().find_map(|qualifier| {
        let value = token.strip_prefix(qualifier.prefix())?.trim();
        (!value.is_empty()).then(|| ParsedSearchToken {
            qualifier,
            value: value.to_owned(),
        })
    })
}

pub fn build_search_token(qualifier: SearchQualifier, value: &str) -> String {
    format!("{}{value}", qualifier.prefix())
}

pub fn is_author_token(token: &str) -> bool {
    token.starts_with(SearchQualifier::Author.prefix())
}

pub fn is_org_token(token: &str) -> bool {
    token.starts_with(SearchQualifier::Org.prefix())
}

pub fn is_repo_token(token: &str) -> bool {
    token.starts_with(SearchQualifier::Repo.prefix())
}

pub fn has_include_search_filters(settings: &SettingsState) -> bool {
    !settings.filter_include_search_tokens.is_empty()
}

pub fn has_exclude_search_filters(settings: &SettingsState) -> bool {
    !settings.filter_exclude_search_tokens.is_empty()
}

/// Case-insensitive, whole-value match of `token` against the notification.
/// Unknown qualifiers and empty values never match.
pub fn filter_notification_by_search_term(notification: &Notification, token: &str) -> bool {
    let Some(parsed) = parse_search_input(token) else {
        return false;
    };

    let field = match parsed.qualifier {
        SearchQualifier::Author => notification
            .subject
            .user
            .as_ref()
            .map(|user| user.login.as_str()),
        SearchQualifier::Org => notification
            .repository
            .as_ref()
            .map(|repository| repository.owner.login.as_str()),
        SearchQualifier::Repo => notification
            .repository
            .as_ref()
            .map(|repository| repository.full_name.as_str()),
    };

    field.is_some_and(|field| field.to_lowercase() == parsed.value.to_lowercase())
}

pub(super) fn user_matches_token(user: Option<&NotificationUser>, token: &str) -> bool {
    match parse_search_input(token) {
        Some(ParsedSearchToken {
            qualifier: SearchQualifier::Author,
            value,
        }) => user.is_some_and(|user| user.login.to_lowercase() == value.to_lowercase()),
        _ => false,
    }
}
