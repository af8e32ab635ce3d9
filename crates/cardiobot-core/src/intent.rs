//! Normalized inbound intents and outbound messages.
//!
//! The core never sees transport-level payloads. The messaging adapter
//! normalizes whatever arrives on the wire into an [`Intent`], and every
//! reply or reminder leaves the core as an [`Outbound`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentKind {
    StartMorning,
    StartEvening,
    TextInput { text: String },
    Cancel,
}

/// One normalized inbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub user_id: String,
    pub kind: IntentKind,
    pub received_at: DateTime<Utc>,
}

impl Intent {
    pub fn new(user_id: impl Into<String>, kind: IntentKind, received_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            received_at,
        }
    }
}

/// Category of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    PromptNextField,
    ValidationError,
    CompletionSummary,
    Cancelled,
    AlreadyMeasured,
    Reminder,
    EscalationReminder,
}

/// One message for the messaging collaborator to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outbound {
    pub user_id: String,
    pub kind: OutboundKind,
    pub text: String,
}

impl Outbound {
    pub fn new(user_id: impl Into<String>, kind: OutboundKind, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            text: text.into(),
        }
    }
}
