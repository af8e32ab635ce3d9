//! Core error types for cardiobot-core.
//!
//! The taxonomy separates locally recoverable input mistakes
//! ([`InputError`]), intent misuse surfaced back to the user
//! ([`SessionError`]), collaborator failures ([`ArchiveError`]) and fatal
//! configuration problems ([`ConfigError`]).

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::reading::{Field, Slot};

/// Top-level error type for cardiobot-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session lifecycle errors
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Archive collaborator errors
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session lifecycle errors, surfaced to the user as messages.
///
/// None of these mutate session state: a rejected `create` leaves no
/// session behind and a rejected `advance`/`cancel` leaves the existing
/// session untouched.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A measurement session is already underway for this user.
    #[error("a measurement session is already in progress")]
    SessionInProgress,

    /// No session exists to advance or cancel.
    #[error("no active measurement session")]
    NoActiveSession,

    /// A reading for this day and slot is already recorded.
    #[error("the {slot} measurement for {day} is already recorded")]
    AlreadyMeasured { slot: Slot, day: NaiveDate },

    /// The gate could not be consulted; starting a session is refused
    /// rather than risking a duplicate reading (fail closed).
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Invalid numeric input inside a session. The session state is unchanged
/// and the same field prompt applies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The text does not parse as an integer.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// The value parses but falls outside the field's plausible range.
    #[error("{field:?} value {value} outside {min}..={max}")]
    OutOfRange {
        field: Field,
        value: i64,
        min: u16,
        max: u16,
    },

    /// The session already reached a terminal state.
    #[error("session already closed")]
    Closed,
}

/// Archive collaborator failures.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive could not be reached or answered with a transport error.
    #[error("archive unavailable: {0}")]
    Unavailable(String),

    /// The archive did not answer within the request timeout.
    #[error("archive request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The archive answered but rejected the request.
    #[error("archive rejected the request: {0}")]
    Rejected(String),
}

/// Configuration errors. Fatal at startup: the scheduler must not run with
/// an unparsable timezone or inverted thresholds.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to load a configuration file
    #[error("failed to load {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save a configuration file
    #[error("failed to save {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
