//! TOML-based daemon configuration.
//!
//! Stored at `~/.config/cardiobot/config.toml`. Secrets can be supplied
//! through the environment instead of the file:
//! CARDIOBOT_BOT_TOKEN, CARDIOBOT_USER_ID, CARDIOBOT_SHEET_ID,
//! CARDIOBOT_SHEETS_TOKEN.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use cardiobot_core::error::ConfigError;
use cardiobot_core::storage::data_dir;

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// The single authorized chat id. Updates from anyone else are dropped.
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_telegram_base")]
    pub api_base: String,
    #[serde(default = "default_long_poll_secs")]
    pub long_poll_secs: u64,
}

/// Google Sheets archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_sheets_base")]
    pub api_base: String,
    /// Range holding one appended row per reading.
    #[serde(default = "default_sheet_range")]
    pub range: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Scheduler loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Daemon configuration.
///
/// Serialized to/from TOML at `~/.config/cardiobot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

// Default functions
fn default_telegram_base() -> String {
    "https://api.telegram.org".into()
}
fn default_long_poll_secs() -> u64 {
    25
}
fn default_sheets_base() -> String {
    "https://sheets.googleapis.com".into()
}
fn default_sheet_range() -> String {
    "Sheet1!A:I".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_secs() -> u64 {
    cardiobot_core::DEFAULT_POLL_INTERVAL_SECS
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            user_id: String::new(),
            api_base: default_telegram_base(),
            long_poll_secs: default_long_poll_secs(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            access_token: String::new(),
            api_base: default_sheets_base(),
            range: default_sheet_range(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            sheets: SheetsConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Environment overrides for secrets and ids.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("CARDIOBOT_BOT_TOKEN") {
            self.telegram.bot_token = value;
        }
        if let Ok(value) = std::env::var("CARDIOBOT_USER_ID") {
            self.telegram.user_id = value;
        }
        if let Ok(value) = std::env::var("CARDIOBOT_SHEET_ID") {
            self.sheets.spreadsheet_id = value;
        }
        if let Ok(value) = std::env::var("CARDIOBOT_SHEETS_TOKEN") {
            self.sheets.access_token = value;
        }
        self
    }

    /// Startup validation; the daemon refuses to run without these.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::MissingKey("telegram.bot_token".into()));
        }
        if self.telegram.user_id.is_empty() {
            return Err(ConfigError::MissingKey("telegram.user_id".into()));
        }
        if self.sheets.spreadsheet_id.is_empty() {
            return Err(ConfigError::MissingKey("sheets.spreadsheet_id".into()));
        }
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.poll_interval_secs".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }
}
