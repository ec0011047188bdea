use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::documents::read_json_document;

pub const DEFAULT_CONFIG_FILE: &str = "raidwatch.json";
pub const CONFIG_PATH_ENV: &str = "RAIDWATCH_CONFIG";
pub const LOG_FILE_ENV: &str = "RAIDWATCH_LOG_FILE";
pub const WEBHOOK_URL_ENV: &str = "RAIDWATCH_WEBHOOK_URL";
pub const DATA_DIRECTORY_ENV: &str = "RAIDWATCH_DATA_DIR";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerSettings {
    pub log_file_path: String,
    pub webhook_url: String,
    pub data_directory: String,
    pub profiles_directory: Option<String>,
    pub bot_username: Option<String>,
    pub bot_avatar_url: Option<String>,
    pub mention_everyone_on_start: bool,
    pub raid_start_phrases: Vec<String>,
    pub join_debounce_millis: u64,
    pub log_level: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            log_file_path: "BepInEx/LogOutput.log".to_string(),
            webhook_url: String::new(),
            data_directory: "data".to_string(),
            profiles_directory: None,
            bot_username: None,
            bot_avatar_url: None,
            mention_everyone_on_start: true,
            raid_start_phrases: Vec::new(),
            join_debounce_millis: 1500,
            log_level: "info".to_string(),
        }
    }
}

impl TrackerSettings {
    /// Missing file means defaults; an unreadable or corrupt file is an error.
    pub fn load(config_path: &Path) -> Result<Self, String> {
        Ok(read_json_document::<Self>(config_path)?.unwrap_or_default())
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(LOG_FILE_ENV).filter(|value| !value.trim().is_empty()) {
            self.log_file_path = value;
        }
        if let Some(value) = lookup(WEBHOOK_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.webhook_url = value;
        }
        if let Some(value) = lookup(DATA_DIRECTORY_ENV).filter(|value| !value.trim().is_empty()) {
            self.data_directory = value;
        }
    }

    pub fn webhook_is_valid(&self) -> bool {
        self.webhook_url.trim().starts_with("https://")
    }

    pub fn join_debounce(&self) -> Duration {
        Duration::from_millis(self.join_debounce_millis)
    }

    pub fn profiles_path(&self) -> Option<PathBuf> {
        self.profiles_directory
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }
}

pub fn resolve_config_path<F>(cli_argument: Option<String>, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    cli_argument
        .or_else(|| lookup(CONFIG_PATH_ENV))
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
