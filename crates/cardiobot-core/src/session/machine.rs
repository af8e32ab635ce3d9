//! Measurement conversation state machine.
//!
//! One session walks the user through the six fields in fixed order.
//! Invalid input leaves the state untouched so the same prompt can be
//! re-issued; the sequence cannot be reordered or skipped.
//!
//! ## State Transitions
//!
//! ```text
//! AwaitingField(left_systolic) -> ... -> AwaitingField(right_pulse)
//!     -> Completed
//! AwaitingField(_) -> Cancelled
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InputError;
use crate::reading::{ArmMeasurement, Field, Reading, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "field", rename_all = "snake_case")]
pub enum SessionState {
    AwaitingField(Field),
    Completed,
    Cancelled,
}

/// Values collected so far, one slot per [`Field`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Collected {
    left_systolic: Option<u16>,
    left_diastolic: Option<u16>,
    left_pulse: Option<u16>,
    right_systolic: Option<u16>,
    right_diastolic: Option<u16>,
    right_pulse: Option<u16>,
}

impl Collected {
    fn set(&mut self, field: Field, value: u16) {
        match field {
            Field::LeftSystolic => self.left_systolic = Some(value),
            Field::LeftDiastolic => self.left_diastolic = Some(value),
            Field::LeftPulse => self.left_pulse = Some(value),
            Field::RightSystolic => self.right_systolic = Some(value),
            Field::RightDiastolic => self.right_diastolic = Some(value),
            Field::RightPulse => self.right_pulse = Some(value),
        }
    }

    fn finish(&self) -> Option<(ArmMeasurement, ArmMeasurement)> {
        Some((
            ArmMeasurement {
                systolic: self.left_systolic?,
                diastolic: self.left_diastolic?,
                pulse: self.left_pulse?,
            },
            ArmMeasurement {
                systolic: self.right_systolic?,
                diastolic: self.right_diastolic?,
                pulse: self.right_pulse?,
            },
        ))
    }
}

/// Outcome of accepting one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Value recorded; prompt for the next field.
    Next(Field),
    /// Sixth value recorded; the session is complete.
    Completed,
}

/// Per-user working state while a reading is being entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementSession {
    user_id: String,
    slot: Slot,
    day: NaiveDate,
    state: SessionState,
    collected: Collected,
    started_at: DateTime<Utc>,
}

impl MeasurementSession {
    pub fn new(
        user_id: impl Into<String>,
        slot: Slot,
        day: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            slot,
            day,
            state: SessionState::AwaitingField(Field::first()),
            collected: Collected::default(),
            started_at,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The field currently being prompted for, if the session is live.
    pub fn current_field(&self) -> Option<Field> {
        match self.state {
            SessionState::AwaitingField(field) => Some(field),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed one line of user input.
    ///
    /// On error the state is unchanged: the caller re-issues the prompt
    /// for the same field.
    pub fn input(&mut self, text: &str) -> Result<InputOutcome, InputError> {
        let field = match self.state {
            SessionState::AwaitingField(field) => field,
            _ => return Err(InputError::Closed),
        };

        let trimmed = text.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
        let (min, max) = field.range();
        if value < i64::from(min) || value > i64::from(max) {
            return Err(InputError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }

        self.collected.set(field, value as u16);
        match field.next() {
            Some(next) => {
                self.state = SessionState::AwaitingField(next);
                Ok(InputOutcome::Next(next))
            }
            None => {
                self.state = SessionState::Completed;
                Ok(InputOutcome::Completed)
            }
        }
    }

    /// Cancel the session. Legal from any awaiting state; returns `false`
    /// once the session already reached a terminal state.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            SessionState::AwaitingField(_) => {
                self.state = SessionState::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Package the collected values as an archivable reading.
    ///
    /// Returns `None` unless the session is complete.
    pub fn to_reading(&self, captured_at: DateTime<Utc>) -> Option<Reading> {
        if self.state != SessionState::Completed {
            return None;
        }
        let (left, right) = self.collected.finish()?;
        Some(Reading {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            day: self.day,
            slot: self.slot,
            left,
            right,
            captured_at,
        })
    }
}
