use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use gh_inbox::{
    HttpClient,
    domain::{Account, AccountNotifications},
    filters::{parse_search_input, reason_details},
    formatters::{format_metric_description, format_notification},
    get_all_notifications,
    group::flattened_notifications_by_repo,
    remove::{remove_notifications_for_account, unread_notification_count},
    settings::{GroupBy, SettingsState},
    storage::ConfigStore,
};
use tracing::{info, warn};

#[derive(Clone, Copy, ValueEnum)]
enum GroupByArg {
    Date,
    Repository,
}

impl From<GroupByArg> for GroupBy {
    fn from(value: GroupByArg) -> Self {
        match value {
            GroupByArg::Date => GroupBy::Date,
            GroupByArg::Repository => GroupBy::Repository,
        }
    }
}

#[derive(Parser)]
#[command(name = "gh-inbox")]
#[command(about = "Fetch, enrich and filter GitHub notifications")]
struct Cli {
    /// Directory holding accounts.json and settings.json (defaults to ~/.gh-inbox)
    #[arg(long, env = "GH_INBOX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Override the configured grouping
    #[arg(long, value_enum)]
    group_by: Option<GroupByArg>,

    /// Skip per-notification enrichment requests
    #[arg(long)]
    no_details: bool,

    /// Include search token, e.g. `repo:owner/name` (repeatable)
    #[arg(long = "include", value_name = "TOKEN")]
    include: Vec<String>,

    /// Exclude search token, e.g. `author:dependabot[bot]` (repeatable)
    #[arg(long = "exclude", value_name = "TOKEN")]
    exclude: Vec<String>,

    /// Mark a thread as read after fetching (repeatable)
    #[arg(long = "mark-read", value_name = "THREAD_ID")]
    mark_read: Vec<String>,

    /// Mark a thread as done after fetching (repeatable)
    #[arg(long = "mark-done", value_name = "THREAD_ID")]
    mark_done: Vec<String>,

    /// Unsubscribe from a thread and mark it as read (repeatable)
    #[arg(long = "unsubscribe", value_name = "THREAD_ID")]
    unsubscribe: Vec<String>,

    /// Print the enriched notifications as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug)]
enum ThreadAction {
    Read,
    Done,
    Unsubscribe,
}

impl Cli {
    fn apply(&self, settings: &mut SettingsState) {
        if let Some(group_by) = self.group_by {
            settings.group_by = group_by.into();
        }
        if self.no_details {
            settings.detailed_notifications = false;
        }
        settings
            .filter_include_search_tokens
            .extend(search_tokens(&self.include));
        settings
            .filter_exclude_search_tokens
            .extend(search_tokens(&self.exclude));
    }
}

fn search_tokens(raw: &[String]) -> Vec<String> {
    raw.iter()
        .filter(|token| {
            let known = parse_search_input(token).is_some();
            if !known {
                warn!(token = %token, "ignoring unrecognized search token");
            }
            known
        })
        .cloned()
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gh_inbox=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let store = match &cli.config_dir {
        Some(dir) => ConfigStore::at(dir),
        None => ConfigStore::initialize()?,
    };
    let accounts = store.accounts().context("failed to load accounts")?;
    let mut settings = store.settings().context("failed to load settings")?;
    cli.apply(&mut settings);

    if accounts.is_empty() {
        warn!(dir = %store.dir().display(), "no accounts configured");
    }

    let client = HttpClient::new()?;
    let results = get_all_notifications(&client, &accounts, &settings).await;
    let results = apply_thread_actions(&client, &cli, &settings, results).await;
    info!(
        accounts = results.len(),
        unread = unread_notification_count(&results),
        "notifications fetched"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for account in &results {
            print_account(account, &settings);
        }
    }

    Ok(())
}

async fn apply_thread_actions(
    client: &HttpClient,
    cli: &Cli,
    settings: &SettingsState,
    mut results: Vec<AccountNotifications>,
) -> Vec<AccountNotifications> {
    let requested = [
        (ThreadAction::Read, &cli.mark_read),
        (ThreadAction::Done, &cli.mark_done),
        (ThreadAction::Unsubscribe, &cli.unsubscribe),
    ];

    for (action, thread_ids) in requested {
        if thread_ids.is_empty() {
            continue;
        }

        let accounts: Vec<Arc<Account>> = results
            .iter()
            .map(|entry| Arc::clone(&entry.account))
            .collect();
        for account in accounts {
            let mut handled = Vec::new();
            for thread_id in thread_ids {
                let owned = results.iter().any(|entry| {
                    Arc::ptr_eq(&entry.account, &account)
                        && entry.notifications.iter().any(|n| &n.id == thread_id)
                });
                if !owned {
                    continue;
                }

                let outcome = match action {
                    ThreadAction::Read => client.mark_thread_read(&account, thread_id).await,
                    ThreadAction::Done => client.mark_thread_done(&account, thread_id).await,
                    ThreadAction::Unsubscribe => {
                        match client.ignore_thread_subscription(&account, thread_id).await {
                            Ok(()) => client.mark_thread_read(&account, thread_id).await,
                            Err(err) => Err(err),
                        }
                    }
                };

                match outcome {
                    Ok(()) => handled.push(thread_id.as_str()),
                    Err(err) => warn!(
                        thread_id = %thread_id,
                        action = ?action,
                        error = %err,
                        "thread action failed"
                    ),
                }
            }

            results = remove_notifications_for_account(&account, settings, &handled, results);
        }
    }

    results
}

fn print_account(account: &AccountNotifications, settings: &SettingsState) {
    let login = account
        .account
        .user
        .as_ref()
        .map(|user| user.login.as_str())
        .unwrap_or("unknown");
    println!("{} ({login})", account.account.hostname);

    if let Some(kind) = account.error {
        println!("  ! {}", kind.title());
        return;
    }

    for notification in flattened_notifications_by_repo(&account.notifications, settings) {
        let display = format_notification(notification);
        let repository = notification
            .repository
            .as_ref()
            .map(|repository| repository.full_name.as_str())
            .unwrap_or("-");
        let comments = format_metric_description(
            notification.subject.comments.unwrap_or_default(),
            "comment",
        );

        println!(
            "  {} {repository} {}: {}",
            if notification.unread { "*" } else { " " },
            display.notification_type,
            display.title,
        );
        println!(
            "      {}{}{}",
            reason_details(&notification.reason).title,
            if comments.is_empty() { "" } else { ", " },
            comments,
        );
    }
}
