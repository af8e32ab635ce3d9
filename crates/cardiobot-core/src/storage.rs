//! JSON-backed user settings store.
//!
//! Mirrors the layout the settings mini-app wrote: one top-level object
//! keyed by user id, each value holding `notifications`, `thresholds` and
//! `timezone`. Unknown users and missing fields fall back to defaults, so
//! a partial file is always usable.
//!
//! Stored at `~/.config/cardiobot/user_settings.json`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::prefs::{parse_clock, parse_offset, Preferences, PreferencesReader, ReminderSlot};
use crate::thresholds::Thresholds;

/// Returns `~/.config/cardiobot[-dev]/` based on CARDIOBOT_ENV.
///
/// Set CARDIOBOT_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CARDIOBOT_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("cardiobot-dev")
    } else {
        base_dir.join("cardiobot")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Reminder enable flags and times, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub morning_enabled: bool,
    #[serde(default = "default_true")]
    pub evening_enabled: bool,
    #[serde(default = "default_morning_time")]
    pub morning_time: String,
    #[serde(default = "default_evening_time")]
    pub evening_time: String,
}

/// One user's persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_true() -> bool {
    true
}
fn default_morning_time() -> String {
    "09:00".into()
}
fn default_evening_time() -> String {
    "21:00".into()
}
fn default_timezone() -> String {
    "+03:00".into()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            morning_enabled: true,
            evening_enabled: true,
            morning_time: default_morning_time(),
            evening_time: default_evening_time(),
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: NotificationSettings::default(),
            thresholds: Thresholds::default(),
            timezone: default_timezone(),
        }
    }
}

impl UserSettings {
    /// Parse the persisted strings into core preference types.
    pub fn to_preferences(&self) -> Result<Preferences, ConfigError> {
        Ok(Preferences {
            timezone: parse_offset(&self.timezone)?,
            morning: ReminderSlot {
                enabled: self.notifications.morning_enabled,
                time: parse_clock(&self.notifications.morning_time)?,
            },
            evening: ReminderSlot {
                enabled: self.notifications.evening_enabled,
                time: parse_clock(&self.notifications.evening_time)?,
            },
            thresholds: self.thresholds,
        })
    }
}

/// File-backed settings store; one JSON object keyed by user id.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under [`data_dir`].
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(data_dir()?.join("user_settings.json")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_all(&self) -> Result<HashMap<String, UserSettings>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn save_all(&self, all: &HashMap<String, UserSettings>) -> Result<(), ConfigError> {
        let save_err = |message: String| ConfigError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        let content =
            serde_json::to_string_pretty(all).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| save_err(e.to_string()))
    }

    /// Settings for one user; defaults when the user has no entry yet.
    pub fn get(&self, user_id: &str) -> Result<UserSettings, ConfigError> {
        Ok(self
            .load_all()?
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    pub fn set(&self, user_id: &str, settings: UserSettings) -> Result<(), ConfigError> {
        let mut all = self.load_all()?;
        all.insert(user_id.to_string(), settings);
        self.save_all(&all)
    }
}

impl PreferencesReader for SettingsStore {
    fn preferences(&self, user_id: &str) -> Result<Preferences, ConfigError> {
        let prefs = self.get(user_id)?.to_preferences()?;
        prefs.validate()?;
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("user_settings.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = store();
        let settings = store.get("12345").unwrap();
        assert!(settings.notifications.morning_enabled);
        assert_eq!(settings.notifications.morning_time, "09:00");
        assert_eq!(settings.timezone, "+03:00");
    }

    #[test]
    fn set_then_get_roundtrip() {
        let (_dir, store) = store();
        let mut settings = UserSettings::default();
        settings.notifications.evening_time = "20:15".into();
        settings.timezone = "+05:00".into();
        store.set("12345", settings).unwrap();

        let loaded = store.get("12345").unwrap();
        assert_eq!(loaded.notifications.evening_time, "20:15");
        assert_eq!(loaded.timezone, "+05:00");
        // Other users still see defaults.
        assert_eq!(store.get("999").unwrap().timezone, "+03:00");
    }

    #[test]
    fn partial_file_is_merged_with_defaults() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            r#"{"12345": {"notifications": {"morning_time": "07:45"}}}"#,
        )
        .unwrap();

        let settings = store.get("12345").unwrap();
        assert_eq!(settings.notifications.morning_time, "07:45");
        assert_eq!(settings.notifications.evening_time, "21:00");
        assert_eq!(settings.thresholds, Thresholds::default());
    }

    #[test]
    fn preferences_parse_the_persisted_strings() {
        let (_dir, store) = store();
        let prefs = store.preferences("12345").unwrap();
        assert_eq!(
            prefs.morning.time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(prefs.timezone.local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn unparsable_timezone_is_a_config_error() {
        let (_dir, store) = store();
        let mut settings = UserSettings::default();
        settings.timezone = "Mars/Olympus".into();
        store.set("12345", settings).unwrap();
        assert!(store.preferences("12345").is_err());
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.get("12345").is_err());
    }
}
