use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::{
    domain::{Account, AccountUser},
    github::GITHUB_CLOUD_HOSTNAME,
    settings::SettingsState,
};

const CONFIG_DIR_NAME: &str = ".gh-inbox";
const ACCOUNTS_FILE: &str = "accounts.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Default, Deserialize, Clone)]
pub struct StoredAccounts {
    #[serde(default)]
    pub accounts: Vec<StoredAccount>,
}

#[derive(Clone, Deserialize)]
pub struct StoredAccount {
    #[serde(default = "default_hostname")]
    pub hostname: String,
    pub token: String,
    #[serde(default)]
    pub login: Option<String>,
}

fn default_hostname() -> String {
    GITHUB_CLOUD_HOSTNAME.to_owned()
}

impl From<StoredAccount> for Account {
    fn from(entry: StoredAccount) -> Self {
        Account {
            hostname: entry.hostname,
            token: entry.token,
            user: entry.login.map(|login| AccountUser { login, name: None }),
        }
    }
}

/// Read-only view over the `~/.gh-inbox` configuration directory. Missing
/// files fall back to empty accounts and default settings.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn initialize() -> Result<Self, ConfigError> {
        let home = env::var("HOME").map_err(|_| ConfigError::HomeDirMissing)?;
        Ok(Self::at(PathBuf::from(home).join(CONFIG_DIR_NAME)))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn accounts(&self) -> Result<Vec<Arc<Account>>, ConfigError> {
        let registry: StoredAccounts = self.read_json(ACCOUNTS_FILE)?.unwrap_or_default();
        Ok(registry
            .accounts
            .into_iter()
            .filter(|entry| !entry.token.trim().is_empty())
            .map(|entry| Arc::new(Account::from(entry)))
            .collect())
    }

    pub fn settings(&self) -> Result<SettingsState, ConfigError> {
        Ok(self.read_json(SETTINGS_FILE)?.unwrap_or_default())
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, ConfigError> {
        let path = self.dir.join(file);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable is not set; cannot locate ~/.gh-inbox")]
    HomeDirMissing,
    #[error("I/O error while reading configuration: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse configuration: {0}")]
    Serialization(#[from] serde_json::Error),
}
