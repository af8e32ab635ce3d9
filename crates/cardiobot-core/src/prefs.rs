//! User preferences consumed by the scheduler and on session completion.
//!
//! Preferences are owned by an external store; the core loads them fresh
//! through [`PreferencesReader`] once per scheduling decision and never
//! caches the result.

use chrono::{FixedOffset, NaiveTime};

use crate::error::ConfigError;
use crate::thresholds::Thresholds;

/// One daily reminder occasion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSlot {
    pub enabled: bool,
    /// Base fire time, local to the user's timezone.
    pub time: NaiveTime,
}

/// Everything the core needs to know about the user.
#[derive(Debug, Clone)]
pub struct Preferences {
    pub timezone: FixedOffset,
    pub morning: ReminderSlot,
    pub evening: ReminderSlot,
    pub thresholds: Thresholds,
}

impl Preferences {
    /// Startup validation. A failure here is fatal: the scheduler must not
    /// run against inverted thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()
    }
}

/// Source of per-user preferences. Implementations return the currently
/// persisted values on every call.
pub trait PreferencesReader: Send + Sync {
    fn preferences(&self, user_id: &str) -> Result<Preferences, ConfigError>;
}

/// Parse an `"HH:MM"` clock time.
pub fn parse_clock(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ConfigError::InvalidValue {
        key: "time".into(),
        message: format!("expected HH:MM, got {s:?}"),
    })
}

/// Parse a UTC offset in `"+HH:MM"` / `"-HH:MM"` form (`"Z"` and `"UTC"`
/// are accepted as zero).
pub fn parse_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "timezone".into(),
        message: format!("expected +HH:MM or -HH:MM, got {s:?}"),
    };

    if s == "Z" || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let sign = match s.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(invalid()),
    };
    let (hours, minutes) = s[1..].split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_times() {
        assert_eq!(
            parse_clock("09:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_clock("21:30").unwrap(),
            NaiveTime::from_hms_opt(21, 30, 0).unwrap()
        );
        assert!(parse_clock("9am").is_err());
        assert!(parse_clock("25:00").is_err());
    }

    #[test]
    fn parses_utc_offsets() {
        assert_eq!(
            parse_offset("+03:00").unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap()
        );
        assert_eq!(
            parse_offset("-05:30").unwrap(),
            FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert_eq!(parse_offset("Z").unwrap(), FixedOffset::east_opt(0).unwrap());
        assert_eq!(
            parse_offset("UTC").unwrap(),
            FixedOffset::east_opt(0).unwrap()
        );
        assert!(parse_offset("Europe/Moscow").is_err());
        assert!(parse_offset("+25:00").is_err());
        assert!(parse_offset("").is_err());
    }

    #[test]
    fn validate_delegates_to_thresholds() {
        let mut prefs = Preferences {
            timezone: FixedOffset::east_opt(0).unwrap(),
            morning: ReminderSlot {
                enabled: true,
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            },
            evening: ReminderSlot {
                enabled: true,
                time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            },
            thresholds: Thresholds::default(),
        };
        assert!(prefs.validate().is_ok());
        prefs.thresholds.optimal_upper = 200;
        assert!(prefs.validate().is_err());
    }
}
