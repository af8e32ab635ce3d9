use clap::Subcommand;

use cardiobot_core::SettingsStore;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print a user's stored settings as JSON
    Show { user_id: String },
    /// Update one or more settings fields
    Set {
        user_id: String,
        /// Morning reminder time, HH:MM
        #[arg(long)]
        morning_time: Option<String>,
        /// Evening reminder time, HH:MM
        #[arg(long)]
        evening_time: Option<String>,
        #[arg(long)]
        morning_enabled: Option<bool>,
        #[arg(long)]
        evening_enabled: Option<bool>,
        /// UTC offset, e.g. +03:00
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        optimal_upper: Option<u16>,
        #[arg(long)]
        optimal_lower: Option<u16>,
        #[arg(long)]
        good_upper: Option<u16>,
        #[arg(long)]
        good_lower: Option<u16>,
    },
    /// Print the settings file path
    Path,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SettingsStore::open_default()?;

    match action {
        SettingsAction::Show { user_id } => {
            let settings = store.get(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            user_id,
            morning_time,
            evening_time,
            morning_enabled,
            evening_enabled,
            timezone,
            optimal_upper,
            optimal_lower,
            good_upper,
            good_lower,
        } => {
            let mut settings = store.get(&user_id)?;
            if let Some(value) = morning_time {
                settings.notifications.morning_time = value;
            }
            if let Some(value) = evening_time {
                settings.notifications.evening_time = value;
            }
            if let Some(value) = morning_enabled {
                settings.notifications.morning_enabled = value;
            }
            if let Some(value) = evening_enabled {
                settings.notifications.evening_enabled = value;
            }
            if let Some(value) = timezone {
                settings.timezone = value;
            }
            if let Some(value) = optimal_upper {
                settings.thresholds.optimal_upper = value;
            }
            if let Some(value) = optimal_lower {
                settings.thresholds.optimal_lower = value;
            }
            if let Some(value) = good_upper {
                settings.thresholds.good_upper = value;
            }
            if let Some(value) = good_lower {
                settings.thresholds.good_lower = value;
            }

            // Reject unusable values before they reach the daemon.
            let prefs = settings.to_preferences()?;
            prefs.validate()?;

            store.set(&user_id, settings)?;
            println!("Settings updated for {user_id}");
        }
        SettingsAction::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}
