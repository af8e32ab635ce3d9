//! Session registry: at most one measurement session per user.
//!
//! The original kept the in-progress measurement in a process-wide
//! dictionary; here every session is owned by this store, keyed by user id,
//! with a per-user lock. The outer map lock is held only long enough to
//! fetch the user's cell, so intents for different users never serialize
//! against each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::archive::ArchiveWriter;
use crate::error::SessionError;
use crate::gate::MeasurementGate;
use crate::intent::{Intent, IntentKind, Outbound, OutboundKind};
use crate::messages;
use crate::prefs::Preferences;
use crate::reading::{Reading, Slot};
use crate::session::machine::{InputOutcome, MeasurementSession};

#[derive(Default)]
struct UserCell {
    session: Option<MeasurementSession>,
}

/// Owns every active session plus the queue of completed readings whose
/// archive write has not succeeded yet. Queued readings are never dropped.
pub struct SessionStore {
    cells: Mutex<HashMap<String, Arc<Mutex<UserCell>>>>,
    pending: Mutex<Vec<Reading>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn cell(&self, user_id: &str) -> Arc<Mutex<UserCell>> {
        self.cells
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    fn pending_has(&self, user_id: &str, day: NaiveDate, slot: Slot) -> bool {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.user_id == user_id && r.day == day && r.slot == slot)
    }

    pub fn has_session(&self, user_id: &str) -> bool {
        self.cell(user_id).lock().unwrap().session.is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Start a session for today's slot.
    ///
    /// Fails with `SessionInProgress` if one exists, `AlreadyMeasured` if
    /// the gate (or the pending queue) already holds a reading for the
    /// slot, and refuses outright when the gate cannot be read at all
    /// (fail closed).
    pub fn create(
        &self,
        user_id: &str,
        slot: Slot,
        now: DateTime<Utc>,
        prefs: &Preferences,
        gate: &MeasurementGate,
    ) -> Result<Outbound, SessionError> {
        let cell = self.cell(user_id);
        let mut cell = cell.lock().unwrap();

        if cell.session.is_some() {
            return Err(SessionError::SessionInProgress);
        }

        let today = now.with_timezone(&prefs.timezone).date_naive();
        if self.pending_has(user_id, today, slot) || gate.has_reading(user_id, today, slot)? {
            return Err(SessionError::AlreadyMeasured { slot, day: today });
        }

        cell.session = Some(MeasurementSession::new(user_id, slot, today, now));
        info!(user_id, slot = slot.as_str(), "measurement session started");
        Ok(Outbound::new(
            user_id,
            OutboundKind::PromptNextField,
            messages::start_prompt(slot),
        ))
    }

    /// Feed user text into the active session.
    ///
    /// On completion the reading is archived and both arms are classified
    /// for the summary. A failed write queues the reading for retry and
    /// says so in the reply; the collected values are never discarded.
    pub fn advance(
        &self,
        user_id: &str,
        text: &str,
        now: DateTime<Utc>,
        prefs: &Preferences,
        archive: &dyn ArchiveWriter,
    ) -> Result<Vec<Outbound>, SessionError> {
        let cell = self.cell(user_id);
        let mut cell = cell.lock().unwrap();

        let outcome = match cell.session.as_mut() {
            Some(session) => session.input(text),
            None => return Err(SessionError::NoActiveSession),
        };

        match outcome {
            Ok(InputOutcome::Next(field)) => Ok(vec![Outbound::new(
                user_id,
                OutboundKind::PromptNextField,
                messages::field_prompt(field),
            )]),
            Ok(InputOutcome::Completed) => {
                let session = cell.session.take().expect("session checked above");
                let reading = session
                    .to_reading(now)
                    .expect("completed session yields a reading");

                let left = prefs
                    .thresholds
                    .classify(reading.left.systolic, reading.left.diastolic);
                let right = prefs
                    .thresholds
                    .classify(reading.right.systolic, reading.right.diastolic);
                let mut summary = messages::completion_summary(&reading, left, right);

                match archive.append(&reading) {
                    Ok(()) => {
                        info!(user_id, slot = reading.slot.as_str(), "reading archived");
                    }
                    Err(err) => {
                        warn!(
                            user_id,
                            error = %err,
                            "archive write failed, reading queued for retry"
                        );
                        self.pending.lock().unwrap().push(reading);
                        summary.push_str("\n\n");
                        summary.push_str(messages::pending_archive_notice());
                    }
                }

                Ok(vec![Outbound::new(
                    user_id,
                    OutboundKind::CompletionSummary,
                    summary,
                )])
            }
            Err(err) => Ok(vec![Outbound::new(
                user_id,
                OutboundKind::ValidationError,
                messages::input_error(&err),
            )]),
        }
    }

    /// Cancel the active session. Touches only in-memory state; never waits
    /// on the archive.
    pub fn cancel(&self, user_id: &str) -> Result<Outbound, SessionError> {
        let cell = self.cell(user_id);
        let mut cell = cell.lock().unwrap();

        let mut session = cell.session.take().ok_or(SessionError::NoActiveSession)?;
        session.cancel();
        info!(user_id, "measurement session cancelled");
        Ok(Outbound::new(
            user_id,
            OutboundKind::Cancelled,
            messages::cancelled(),
        ))
    }

    /// Retry queued archive writes. Failures stay queued; returns how many
    /// readings were flushed.
    pub fn flush_pending(&self, archive: &dyn ArchiveWriter) -> usize {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_empty() {
            return 0;
        }

        let mut kept = Vec::new();
        let mut flushed = 0;
        for reading in pending.drain(..) {
            match archive.append(&reading) {
                Ok(()) => {
                    flushed += 1;
                    info!(
                        user_id = reading.user_id.as_str(),
                        slot = reading.slot.as_str(),
                        "queued reading archived"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "queued reading still unarchived");
                    kept.push(reading);
                }
            }
        }
        *pending = kept;
        flushed
    }

    /// Route a normalized intent, mapping session errors to user-facing
    /// replies.
    pub fn dispatch(
        &self,
        intent: &Intent,
        prefs: &Preferences,
        gate: &MeasurementGate,
        archive: &dyn ArchiveWriter,
    ) -> Vec<Outbound> {
        let user_id = intent.user_id.as_str();
        let result = match &intent.kind {
            IntentKind::StartMorning => self
                .create(user_id, Slot::Morning, intent.received_at, prefs, gate)
                .map(|out| vec![out]),
            IntentKind::StartEvening => self
                .create(user_id, Slot::Evening, intent.received_at, prefs, gate)
                .map(|out| vec![out]),
            IntentKind::TextInput { text } => {
                self.advance(user_id, text, intent.received_at, prefs, archive)
            }
            IntentKind::Cancel => self.cancel(user_id).map(|out| vec![out]),
        };

        result.unwrap_or_else(|err| vec![outbound_for_error(user_id, &err)])
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn outbound_for_error(user_id: &str, err: &SessionError) -> Outbound {
    match err {
        SessionError::SessionInProgress => Outbound::new(
            user_id,
            OutboundKind::ValidationError,
            messages::session_in_progress(),
        ),
        SessionError::NoActiveSession => Outbound::new(
            user_id,
            OutboundKind::ValidationError,
            messages::no_active_session(),
        ),
        SessionError::AlreadyMeasured { slot, .. } => Outbound::new(
            user_id,
            OutboundKind::AlreadyMeasured,
            messages::already_measured(*slot),
        ),
        SessionError::Archive(_) => Outbound::new(
            user_id,
            OutboundKind::ValidationError,
            messages::archive_unreachable(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::prefs::ReminderSlot;
    use crate::thresholds::Thresholds;
    use chrono::{FixedOffset, NaiveTime, TimeZone};

    fn prefs() -> Preferences {
        Preferences {
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
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap()
    }

    fn fixture() -> (SessionStore, Arc<MemoryArchive>, MeasurementGate) {
        let archive = Arc::new(MemoryArchive::new());
        let gate = MeasurementGate::new(archive.clone());
        (SessionStore::new(), archive, gate)
    }

    #[test]
    fn create_is_idempotent_rejecting() {
        let (store, _archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        let err = store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionInProgress));
        // Evening is also blocked: one session per user, not per slot.
        let err = store
            .create("u", Slot::Evening, now(), &prefs(), &gate)
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionInProgress));
    }

    #[test]
    fn completed_slot_blocks_restart_for_the_day() {
        let (store, archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        for value in ["120", "80", "70", "118", "76", "68"] {
            store
                .advance("u", value, now(), &prefs(), archive.as_ref())
                .unwrap();
        }
        assert_eq!(archive.rows().len(), 1);

        let err = store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyMeasured { .. }));
        // The other slot is still open.
        store
            .create("u", Slot::Evening, now(), &prefs(), &gate)
            .unwrap();
    }

    #[test]
    fn cancel_twice_reports_no_active_session() {
        let (store, _archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        store.cancel("u").unwrap();
        let err = store.cancel("u").unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession));
    }

    #[test]
    fn cancel_midway_allows_same_day_restart() {
        let (store, archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        store
            .advance("u", "120", now(), &prefs(), archive.as_ref())
            .unwrap();
        store
            .advance("u", "80", now(), &prefs(), archive.as_ref())
            .unwrap();
        store.cancel("u").unwrap();

        assert!(archive.rows().is_empty());
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
    }

    #[test]
    fn gate_failure_blocks_create() {
        let (store, archive, gate) = fixture();
        archive.set_fail_reads(true);
        let err = store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap_err();
        assert!(matches!(err, SessionError::Archive(_)));
        assert!(!store.has_session("u"));
    }

    #[test]
    fn failed_write_queues_reading_and_blocks_duplicate_entry() {
        let (store, archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        archive.set_fail_writes(true);
        let mut replies = Vec::new();
        for value in ["120", "80", "70", "118", "76", "68"] {
            replies = store
                .advance("u", value, now(), &prefs(), archive.as_ref())
                .unwrap();
        }

        assert_eq!(store.pending_count(), 1);
        assert!(replies[0].text.contains("не потеряны"));

        // The archive has no row yet, but the pending queue still counts:
        // no second morning entry may start.
        let err = store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyMeasured { .. }));

        archive.set_fail_writes(false);
        assert_eq!(store.flush_pending(archive.as_ref()), 1);
        assert_eq!(store.pending_count(), 0);
        assert_eq!(archive.rows().len(), 1);
        assert_eq!(archive.rows()[0].left.systolic, 120);
    }

    #[test]
    fn invalid_input_reprompts_without_state_change() {
        let (store, archive, gate) = fixture();
        store
            .create("u", Slot::Morning, now(), &prefs(), &gate)
            .unwrap();
        let replies = store
            .advance("u", "abc", now(), &prefs(), archive.as_ref())
            .unwrap();
        assert_eq!(replies[0].kind, OutboundKind::ValidationError);

        // Still on the first field.
        let replies = store
            .advance("u", "120", now(), &prefs(), archive.as_ref())
            .unwrap();
        assert!(replies[0].text.contains("НИЖНЕЕ"));
    }

    #[test]
    fn dispatch_maps_errors_to_replies() {
        let (store, archive, gate) = fixture();
        let intent = Intent::new("u", IntentKind::Cancel, now());
        let replies = store.dispatch(&intent, &prefs(), &gate, archive.as_ref());
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].kind, OutboundKind::ValidationError);

        let intent = Intent::new("u", IntentKind::StartMorning, now());
        let replies = store.dispatch(&intent, &prefs(), &gate, archive.as_ref());
        assert_eq!(replies[0].kind, OutboundKind::PromptNextField);
    }
}
