// Categories are AND'ed together while the values selected within one
// category are OR'ed. Categories that match on enriched fields run in the
// detailed pass only.

mod reason;
mod search;
mod state;
mod subject_type;
mod user_type;

use crate::{
    domain::{AccountNotifications, Notification, NotificationState, NotificationUser, TypeDetails},
    settings::SettingsState,
};

pub use reason::{REASON_FILTER, ReasonFilter, reason_details};
pub use search::{
    ParsedSearchToken, SearchQualifier, build_search_token, filter_notification_by_search_term,
    has_exclude_search_filters, has_include_search_filters, is_author_token, is_org_token,
    is_repo_token, parse_search_input,
};
pub use state::{STATE_FILTER, StateFilter, map_state_to_filter};
pub use subject_type::{SUBJECT_TYPE_FILTER, SubjectTypeFilter};
pub use user_type::{USER_TYPE_FILTER, UserTypeFilter, is_non_human_user};

/// One filter category over a typed set of values.
pub trait Filter {
    type Value: PartialEq;

    /// Whether matching needs enriched subject fields.
    const REQUIRES_DETAILED_NOTIFICATIONS: bool;

    fn type_details(&self, value: &Self::Value) -> TypeDetails;

    fn selected<'a>(&self, settings: &'a SettingsState) -> &'a [Self::Value];

    fn filter_notification(&self, notification: &Notification, value: &Self::Value) -> bool;

    fn has_filters(&self, settings: &SettingsState) -> bool {
        !self.selected(settings).is_empty()
    }

    fn is_filter_set(&self, settings: &SettingsState, value: &Self::Value) -> bool {
        self.selected(settings).contains(value)
    }

    /// Number of notifications across all accounts matching `value`, used for
    /// badge counts.
    fn filter_count(&self, accounts: &[AccountNotifications], value: &Self::Value) -> usize {
        accounts
            .iter()
            .flat_map(|account| account.notifications.iter())
            .filter(|notification| self.filter_notification(notification, value))
            .count()
    }

    /// True when no value is selected or any selected value matches.
    fn passes(&self, notification: &Notification, settings: &SettingsState) -> bool {
        let selected = self.selected(settings);
        selected.is_empty()
            || selected
                .iter()
                .any(|value| self.filter_notification(notification, value))
    }
}

/// Filters that only need the fields returned by the notifications list.
pub fn filter_base_notifications(
    notifications: Vec<Notification>,
    settings: &SettingsState,
) -> Vec<Notification> {
    notifications
        .into_iter()
        .filter(|notification| passes_filters(notification, settings, false))
        .collect()
}

/// Filters that need enriched fields; a no-op when enrichment is disabled.
pub fn filter_detailed_notifications(
    notifications: Vec<Notification>,
    settings: &SettingsState,
) -> Vec<Notification> {
    if !settings.detailed_notifications {
        return notifications;
    }

    notifications
        .into_iter()
        .filter(|notification| passes_filters(notification, settings, true))
        .collect()
}

// Each category runs in exactly one pass, picked by whether it needs
// enriched fields.
fn passes_filters(notification: &Notification, settings: &SettingsState, detailed: bool) -> bool {
    SearchQualifier::ALL
        .into_iter()
        .filter(|qualifier| qualifier.requires_detailed_notifications() == detailed)
        .all(|qualifier| passes_search_tokens(notification, settings, qualifier))
        && passes_category(&USER_TYPE_FILTER, notification, settings, detailed)
        && passes_category(&SUBJECT_TYPE_FILTER, notification, settings, detailed)
        && passes_category(&STATE_FILTER, notification, settings, detailed)
        && passes_category(&REASON_FILTER, notification, settings, detailed)
}

fn passes_category<F: Filter>(
    filter: &F,
    notification: &Notification,
    settings: &SettingsState,
    detailed: bool,
) -> bool {
    F::REQUIRES_DETAILED_NOTIFICATIONS != detailed || filter.passes(notification, settings)
}

pub fn has_any_filters_set(settings: &SettingsState) -> bool {
    USER_TYPE_FILTER.has_filters(settings)
        || has_include_search_filters(settings)
        || has_exclude_search_filters(settings)
        || SUBJECT_TYPE_FILTER.has_filters(settings)
        || STATE_FILTER.has_filters(settings)
        || REASON_FILTER.has_filters(settings)
}

/// Whether a subject in `state` would be hidden by the state filter. Lets
/// handlers skip network calls for notifications that will be dropped anyway.
pub fn is_state_filtered_out(state: Option<&NotificationState>, settings: &SettingsState) -> bool {
    STATE_FILTER.has_filters(settings)
        && !settings.filter_states.contains(&map_state_to_filter(state))
}

pub fn is_user_filtered_out(user: Option<&NotificationUser>, settings: &SettingsState) -> bool {
    !passes_user_filters(user, settings)
}

fn passes_user_filters(user: Option<&NotificationUser>, settings: &SettingsState) -> bool {
    let passes_user_type = !USER_TYPE_FILTER.has_filters(settings)
        || settings
            .filter_user_types
            .iter()
            .any(|user_type| user_type::user_matches_type(user, user_type));

    passes_user_type
        && passes_token_lists(settings, SearchQualifier::Author, |token| {
            search::user_matches_token(user, token)
        })
}

fn passes_search_tokens(
    notification: &Notification,
    settings: &SettingsState,
    qualifier: SearchQualifier,
) -> bool {
    passes_token_lists(settings, qualifier, |token| {
        filter_notification_by_search_term(notification, token)
    })
}

/// Include tokens for `qualifier` must have at least one match; exclude
/// tokens must have none.
fn passes_token_lists(
    settings: &SettingsState,
    qualifier: SearchQualifier,
    is_match: impl Fn(&str) -> bool,
) -> bool {
    let mut includes = settings
        .filter_include_search_tokens
        .iter()
        .filter(|token| token.starts_with(qualifier.prefix()))
        .peekable();
    if includes.peek().is_some() && !includes.any(|token| is_match(token.as_str())) {
        return false;
    }

    !settings
        .filter_exclude_search_tokens
        .iter()
        .filter(|token| token.starts_with(qualifier.prefix()))
        .any(|token| is_match(token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Reason, SubjectType, UserType},
        settings::FilterStateType,
        test_support::{notification, notification_for_repo, user},
    };

    fn sample() -> Vec<Notification> {
        let mut issue = notification_for_repo("1", Some("gitify-app/gitify"));
        issue.reason = Reason::Mention;
        issue.subject.state = Some(NotificationState::Open);
        issue.subject.user = Some(user("octocat", UserType::User));

        let mut pr = notification(SubjectType::PullRequest);
        pr.id = "2".into();
        pr.repository = Some(crate::test_support::repository("github/other"));
        pr.reason = Reason::ReviewRequested;
        pr.subject.state = Some(NotificationState::Merged);
        pr.subject.user = Some(user("dependabot[bot]", UserType::Bot));

        vec![issue, pr]
    }

    fn ids(notifications: &[Notification]) -> Vec<&str> {
        notifications.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn no_filters_pass_everything() {
        let settings = SettingsState::default();
        assert!(!has_any_filters_set(&settings));
        assert_eq!(ids(&filter_base_notifications(sample(), &settings)), ["1", "2"]);
        assert_eq!(ids(&filter_detailed_notifications(sample(), &settings)), ["1", "2"]);
    }

    #[test]
    fn base_filters_combine_categories() {
        let settings = SettingsState {
            filter_subject_types: vec![SubjectType::Issue, SubjectType::PullRequest],
            filter_reasons: vec![Reason::ReviewRequested],
            ..SettingsState::default()
        };
        assert!(has_any_filters_set(&settings));
        assert_eq!(ids(&filter_base_notifications(sample(), &settings)), ["2"]);
    }

    #[test]
    fn base_filters_apply_repo_and_org_tokens() {
        let settings = SettingsState {
            filter_include_search_tokens: vec!["repo:GITIFY-APP/gitify".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_base_notifications(sample(), &settings)), ["1"]);

        let settings = SettingsState {
            filter_exclude_search_tokens: vec!["org:github".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_base_notifications(sample(), &settings)), ["1"]);
    }

    #[test]
    fn base_filters_ignore_author_tokens() {
        let settings = SettingsState {
            filter_include_search_tokens: vec!["author:nobody".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_base_notifications(sample(), &settings)), ["1", "2"]);
    }

    #[test]
    fn detailed_filters_apply_user_state_and_author() {
        let settings = SettingsState {
            filter_user_types: vec![UserType::User],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_detailed_notifications(sample(), &settings)), ["1"]);

        let settings = SettingsState {
            filter_states: vec![FilterStateType::Merged],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_detailed_notifications(sample(), &settings)), ["2"]);

        let settings = SettingsState {
            filter_exclude_search_tokens: vec!["author:OCTOCAT".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_detailed_notifications(sample(), &settings)), ["2"]);
    }

    #[test]
    fn categories_run_in_the_pass_matching_their_fields() {
        let unmatched_reason = SettingsState {
            filter_reasons: vec![Reason::Manual],
            ..SettingsState::default()
        };
        assert!(filter_base_notifications(sample(), &unmatched_reason).is_empty());
        assert_eq!(
            ids(&filter_detailed_notifications(sample(), &unmatched_reason)),
            ["1", "2"]
        );

        let unmatched_user_type = SettingsState {
            filter_user_types: vec![UserType::Organization],
            ..SettingsState::default()
        };
        assert_eq!(
            ids(&filter_base_notifications(sample(), &unmatched_user_type)),
            ["1", "2"]
        );
        assert!(filter_detailed_notifications(sample(), &unmatched_user_type).is_empty());

        let author = SettingsState {
            filter_include_search_tokens: vec!["author:octocat".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_base_notifications(sample(), &author)), ["1", "2"]);
        assert_eq!(ids(&filter_detailed_notifications(sample(), &author)), ["1"]);

        let org = SettingsState {
            filter_include_search_tokens: vec!["org:github".into()],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_base_notifications(sample(), &org)), ["2"]);
        assert_eq!(ids(&filter_detailed_notifications(sample(), &org)), ["1", "2"]);
    }

    #[test]
    fn detailed_filters_are_skipped_without_enrichment() {
        let settings = SettingsState {
            detailed_notifications: false,
            filter_user_types: vec![UserType::Organization],
            filter_states: vec![FilterStateType::Draft],
            ..SettingsState::default()
        };
        assert_eq!(ids(&filter_detailed_notifications(sample(), &settings)), ["1", "2"]);
    }

    #[test]
    fn state_filtered_out_short_circuit() {
        let settings = SettingsState::default();
        assert!(!is_state_filtered_out(None, &settings));

        let settings = SettingsState {
            filter_states: vec![FilterStateType::Open],
            ..SettingsState::default()
        };
        assert!(is_state_filtered_out(None, &settings));
        assert!(!is_state_filtered_out(Some(&NotificationState::Reopened), &settings));

        let settings = SettingsState {
            filter_states: vec![FilterStateType::Other],
            ..SettingsState::default()
        };
        assert!(!is_state_filtered_out(None, &settings));
    }

    #[test]
    fn user_filtered_out() {
        let settings = SettingsState {
            filter_user_types: vec![UserType::Bot],
            ..SettingsState::default()
        };
        assert!(is_user_filtered_out(Some(&user("octocat", UserType::User)), &settings));
        assert!(!is_user_filtered_out(Some(&user("renovate", UserType::Bot)), &settings));
        assert!(is_user_filtered_out(None, &settings));
    }

    #[test]
    fn filter_counts_span_accounts() {
        let accounts = vec![
            AccountNotifications {
                account: std::sync::Arc::new(crate::test_support::account()),
                notifications: sample(),
                error: None,
            },
            AccountNotifications {
                account: std::sync::Arc::new(crate::test_support::enterprise_account()),
                notifications: sample(),
                error: None,
            },
        ];

        assert_eq!(REASON_FILTER.filter_count(&accounts, &Reason::Mention), 2);
        assert_eq!(SUBJECT_TYPE_FILTER.filter_count(&accounts, &SubjectType::Release), 0);
        assert_eq!(STATE_FILTER.filter_count(&accounts, &FilterStateType::Merged), 2);
    }
}
