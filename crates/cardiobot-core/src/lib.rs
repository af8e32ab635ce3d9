//! # CardioBot Core Library
//!
//! Core business logic for CardioBot, a conversational blood pressure
//! journal: a single end user enters six measurements twice a day through
//! chat, completed readings are archived to an external spreadsheet, and
//! escalating reminders fire until the day's slot is recorded.
//!
//! ## Architecture
//!
//! - **Measurement Session**: per-user state machine over the six entry
//!   fields; invalid input re-prompts without advancing
//! - **Session Store**: registry owning every active session, one per user,
//!   plus the retry queue for readings the archive could not take yet
//! - **Reminder Scheduler**: wall-clock pass that fires the base reminder
//!   and +30/+60 minute escalations, gated on "no reading archived yet"
//! - **Measurement Gate**: fresh read-through check against the archive
//! - **Threshold Evaluator**: pure classification of a pressure pair
//!
//! The transport (Telegram), the spreadsheet adapter and the daemon's two
//! control loops live in `cardiobot-daemon`; this crate only consumes the
//! collaborator traits defined here.

pub mod archive;
pub mod error;
pub mod gate;
pub mod intent;
pub mod messages;
pub mod prefs;
pub mod reading;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod thresholds;

pub use archive::{ArchiveReader, ArchiveWriter, MemoryArchive, RetryBackoff};
pub use error::{ArchiveError, ConfigError, CoreError, InputError, SessionError};
pub use gate::MeasurementGate;
pub use intent::{Intent, IntentKind, Outbound, OutboundKind};
pub use prefs::{Preferences, PreferencesReader, ReminderSlot};
pub use reading::{ArmMeasurement, Field, Reading, Slot, FIELD_ORDER};
pub use scheduler::{ReminderScheduler, DEFAULT_POLL_INTERVAL_SECS, ESCALATION_OFFSETS_MIN};
pub use session::{InputOutcome, MeasurementSession, SessionState, SessionStore};
pub use storage::{data_dir, SettingsStore, UserSettings};
pub use thresholds::{Classification, Thresholds};
