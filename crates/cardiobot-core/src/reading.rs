use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One of the two daily measurement occasions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Morning,
    Evening,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Morning => "morning",
            Slot::Evening => "evening",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six entry fields, in the exact order the user supplies them.
///
/// The ordering is part of the conversation contract: the user types bare
/// numbers, so which field a number lands in is determined entirely by
/// position in this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LeftSystolic,
    LeftDiastolic,
    LeftPulse,
    RightSystolic,
    RightDiastolic,
    RightPulse,
}

/// Entry order, first to last.
pub const FIELD_ORDER: [Field; 6] = [
    Field::LeftSystolic,
    Field::LeftDiastolic,
    Field::LeftPulse,
    Field::RightSystolic,
    Field::RightDiastolic,
    Field::RightPulse,
];

impl Field {
    pub fn first() -> Field {
        Field::LeftSystolic
    }

    /// The field that follows this one, or `None` after the last.
    pub fn next(self) -> Option<Field> {
        match self {
            Field::LeftSystolic => Some(Field::LeftDiastolic),
            Field::LeftDiastolic => Some(Field::LeftPulse),
            Field::LeftPulse => Some(Field::RightSystolic),
            Field::RightSystolic => Some(Field::RightDiastolic),
            Field::RightDiastolic => Some(Field::RightPulse),
            Field::RightPulse => None,
        }
    }

    /// Inclusive physiologically plausible bounds for this field.
    pub fn range(self) -> (u16, u16) {
        match self {
            Field::LeftSystolic | Field::RightSystolic => (60, 260),
            Field::LeftDiastolic | Field::RightDiastolic => (30, 160),
            Field::LeftPulse | Field::RightPulse => (30, 220),
        }
    }
}

/// One arm's worth of measured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmMeasurement {
    pub systolic: u16,
    pub diastolic: u16,
    pub pulse: u16,
}

/// A completed set of six values for one user, day and slot.
///
/// Immutable once archived. The archive holds at most one reading per
/// `(user_id, day, slot)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub user_id: String,
    pub day: NaiveDate,
    pub slot: Slot,
    pub left: ArmMeasurement,
    pub right: ArmMeasurement,
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_walks_left_arm_then_right() {
        let mut walked = vec![Field::first()];
        while let Some(next) = walked.last().unwrap().next() {
            walked.push(next);
        }
        assert_eq!(walked, FIELD_ORDER);
    }

    #[test]
    fn systolic_and_diastolic_ranges_differ() {
        assert_eq!(Field::LeftSystolic.range(), (60, 260));
        assert_eq!(Field::RightDiastolic.range(), (30, 160));
        assert_eq!(Field::LeftPulse.range(), (30, 220));
    }

    #[test]
    fn slot_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Slot::Morning).unwrap(), "\"morning\"");
        assert_eq!(serde_json::to_string(&Slot::Evening).unwrap(), "\"evening\"");
    }
}
