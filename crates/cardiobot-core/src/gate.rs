//! Read-through measurement gate.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::archive::ArchiveReader;
use crate::error::ArchiveError;
use crate::reading::Slot;

/// Answers "is this day's slot already measured?" with a fresh archive read
/// on every call.
///
/// Errors propagate to the caller; a transient failure never reads as
/// "not measured". The Session Store refuses to start a session on an
/// error, and the scheduler skips the slot until the next pass.
#[derive(Clone)]
pub struct MeasurementGate {
    reader: Arc<dyn ArchiveReader>,
}

impl MeasurementGate {
    pub fn new(reader: Arc<dyn ArchiveReader>) -> Self {
        Self { reader }
    }

    pub fn has_reading(
        &self,
        user_id: &str,
        day: NaiveDate,
        slot: Slot,
    ) -> Result<bool, ArchiveError> {
        let exists = self.reader.exists(user_id, day, slot)?;
        debug!(user_id, %day, slot = slot.as_str(), exists, "gate consulted");
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, MemoryArchive};
    use crate::reading::{ArmMeasurement, Reading};
    use chrono::Utc;

    #[test]
    fn reflects_the_archive_without_caching() {
        let archive = Arc::new(MemoryArchive::new());
        let gate = MeasurementGate::new(archive.clone());
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(!gate.has_reading("u", day, Slot::Morning).unwrap());

        let arm = ArmMeasurement {
            systolic: 120,
            diastolic: 80,
            pulse: 70,
        };
        archive
            .append(&Reading {
                id: "r1".into(),
                user_id: "u".into(),
                day,
                slot: Slot::Morning,
                left: arm,
                right: arm,
                captured_at: Utc::now(),
            })
            .unwrap();

        // The very next call sees the new row: no request-scoped cache.
        assert!(gate.has_reading("u", day, Slot::Morning).unwrap());
        assert!(!gate.has_reading("u", day, Slot::Evening).unwrap());
    }

    #[test]
    fn read_failures_propagate() {
        let archive = Arc::new(MemoryArchive::new());
        archive.set_fail_reads(true);
        let gate = MeasurementGate::new(archive);
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(gate.has_reading("u", day, Slot::Morning).is_err());
    }
}
