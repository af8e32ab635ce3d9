//! Escalating reminder scheduler.
//!
//! Level-triggered: each pass recomputes what is due from wall-clock time
//! and a fresh gate read, not from a log of what was sent. The in-memory
//! fired keys only stop duplicate sends within the same day; a process
//! restart can at worst repeat one reminder, never skip one.
//!
//! One evaluation pass runs per polling interval. For every enabled slot
//! the pass checks the three fire instants `base_time + {0, 30, 60}`
//! minutes in the user's timezone and emits whatever is due and not yet
//! measured.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::gate::MeasurementGate;
use crate::intent::{Outbound, OutboundKind};
use crate::messages;
use crate::prefs::Preferences;
use crate::reading::Slot;

/// Escalation offsets from the base reminder time, in minutes.
pub const ESCALATION_OFFSETS_MIN: [i64; 3] = [0, 30, 60];

/// Default evaluation interval. Fine enough to hit minute-granularity
/// reminder times without excess wake-ups.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FiredKey {
    day: NaiveDate,
    slot: Slot,
    offset_min: i64,
}

/// Time-driven reminder loop state for one user.
pub struct ReminderScheduler {
    user_id: String,
    fired: HashSet<FiredKey>,
    current_day: Option<NaiveDate>,
    /// How far past a target instant a fire still counts as "just
    /// crossed". Covers a skipped pass; anything older is dropped.
    grace: Duration,
}

impl ReminderScheduler {
    pub fn new(user_id: impl Into<String>, poll_interval_secs: u64) -> Self {
        Self {
            user_id: user_id.into(),
            fired: HashSet::new(),
            current_day: None,
            grace: Duration::seconds((poll_interval_secs.max(1) * 2) as i64),
        }
    }

    /// One evaluation pass.
    ///
    /// Returns the reminders due right now. The gate is read at most once
    /// per slot per pass; a failed read skips that slot until the next
    /// pass (nothing is marked fired, so the reminder is not lost).
    pub fn pass(
        &mut self,
        now: DateTime<Utc>,
        prefs: &Preferences,
        gate: &MeasurementGate,
    ) -> Vec<Outbound> {
        let local = now.with_timezone(&prefs.timezone);
        let today = local.date_naive();
        self.rollover(today);

        let mut due = Vec::new();
        for (slot, reminder) in [
            (Slot::Morning, &prefs.morning),
            (Slot::Evening, &prefs.evening),
        ] {
            if !reminder.enabled {
                continue;
            }
            let Some(base) = today
                .and_time(reminder.time)
                .and_local_timezone(prefs.timezone)
                .single()
            else {
                continue;
            };

            let candidates: Vec<i64> = ESCALATION_OFFSETS_MIN
                .iter()
                .copied()
                .filter(|&offset| {
                    let target = base + Duration::minutes(offset);
                    target <= local
                        && local - target < self.grace
                        && !self.fired.contains(&FiredKey {
                            day: today,
                            slot,
                            offset_min: offset,
                        })
                })
                .collect();
            if candidates.is_empty() {
                continue;
            }

            // One fresh gate read per slot per pass. A reading recorded at
            // any point suppresses the rest of the ladder because every
            // later pass re-checks here.
            match gate.has_reading(&self.user_id, today, slot) {
                Ok(true) => {
                    debug!(slot = slot.as_str(), "already measured, reminders suppressed");
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        slot = slot.as_str(),
                        error = %err,
                        "gate read failed, slot skipped this pass"
                    );
                    continue;
                }
            }

            for offset in candidates {
                let (kind, text) = if offset == 0 {
                    (OutboundKind::Reminder, messages::reminder(slot))
                } else {
                    (
                        OutboundKind::EscalationReminder,
                        messages::escalation_reminder(slot),
                    )
                };
                due.push(Outbound::new(self.user_id.as_str(), kind, text));
                self.fired.insert(FiredKey {
                    day: today,
                    slot,
                    offset_min: offset,
                });
            }
        }
        due
    }

    fn rollover(&mut self, today: NaiveDate) {
        if self.current_day != Some(today) {
            self.fired.clear();
            self.current_day = Some(today);
        }
    }
}
