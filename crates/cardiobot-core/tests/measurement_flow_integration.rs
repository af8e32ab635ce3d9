//! End-to-end conversation flows through the session store.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

use cardiobot_core::{
    Intent, IntentKind, MeasurementGate, MemoryArchive, OutboundKind, Preferences, ReminderSlot,
    SessionStore, Slot, Thresholds,
};

const USER: &str = "100500";

fn prefs() -> Preferences {
    Preferences {
        timezone: FixedOffset::east_opt(3 * 3600).unwrap(),
        morning: ReminderSlot {
            enabled: true,
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        },
        evening: ReminderSlot {
            enabled: true,
            time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        },
        thresholds: Thresholds {
            optimal_upper: 110,
            optimal_lower: 70,
            good_upper: 130,
            good_lower: 80,
        },
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 6, 10, 0).unwrap()
}

fn fixture() -> (SessionStore, Arc<MemoryArchive>, MeasurementGate) {
    let archive = Arc::new(MemoryArchive::new());
    let gate = MeasurementGate::new(archive.clone());
    (SessionStore::new(), archive, gate)
}

fn send(
    store: &SessionStore,
    archive: &MemoryArchive,
    gate: &MeasurementGate,
    kind: IntentKind,
) -> Vec<cardiobot_core::Outbound> {
    let intent = Intent::new(USER, kind, now());
    store.dispatch(&intent, &prefs(), gate, archive)
}

fn text(s: &str) -> IntentKind {
    IntentKind::TextInput {
        text: s.to_string(),
    }
}

#[test]
fn full_morning_entry_is_archived_with_both_verdicts() {
    let (store, archive, gate) = fixture();

    let replies = send(&store, &archive, &gate, IntentKind::StartMorning);
    assert_eq!(replies[0].kind, OutboundKind::PromptNextField);
    assert!(replies[0].text.contains("Утреннее измерение"));

    let mut last = Vec::new();
    for value in ["120", "80", "70", "118", "76", "68"] {
        last = send(&store, &archive, &gate, text(value));
    }

    assert_eq!(last.len(), 1);
    assert_eq!(last[0].kind, OutboundKind::CompletionSummary);
    // Both arms are classified and reported separately.
    assert!(last[0].text.contains("Левая рука: 120/80, пульс 70"));
    assert!(last[0].text.contains("Правая рука: 118/76, пульс 68"));
    assert_eq!(last[0].text.matches("нормальное").count(), 2);

    let rows = archive.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, USER);
    assert_eq!(rows[0].slot, Slot::Morning);
    assert_eq!(
        (rows[0].left.systolic, rows[0].left.diastolic, rows[0].left.pulse),
        (120, 80, 70)
    );
    assert_eq!(
        (
            rows[0].right.systolic,
            rows[0].right.diastolic,
            rows[0].right.pulse
        ),
        (118, 76, 68)
    );
    // The reading lands on the user's local calendar day.
    assert_eq!(
        rows[0].day,
        now().with_timezone(&prefs().timezone).date_naive()
    );

    // Starting the same slot again is now rejected for the day.
    let replies = send(&store, &archive, &gate, IntentKind::StartMorning);
    assert_eq!(replies[0].kind, OutboundKind::AlreadyMeasured);
}

#[test]
fn cancel_after_two_fields_allows_a_fresh_start() {
    let (store, archive, gate) = fixture();

    send(&store, &archive, &gate, IntentKind::StartMorning);
    send(&store, &archive, &gate, text("120"));
    send(&store, &archive, &gate, text("80"));

    let replies = send(&store, &archive, &gate, IntentKind::Cancel);
    assert_eq!(replies[0].kind, OutboundKind::Cancelled);
    assert!(archive.rows().is_empty());

    // Nothing completed, so the gate lets a new morning session through.
    let replies = send(&store, &archive, &gate, IntentKind::StartMorning);
    assert_eq!(replies[0].kind, OutboundKind::PromptNextField);
}

#[test]
fn invalid_input_reissues_the_same_prompt() {
    let (store, archive, gate) = fixture();

    send(&store, &archive, &gate, IntentKind::StartMorning);
    send(&store, &archive, &gate, text("120"));

    let replies = send(&store, &archive, &gate, text("low"));
    assert_eq!(replies[0].kind, OutboundKind::ValidationError);
    assert_eq!(replies[0].text, "Пожалуйста, введите число:");

    // The session is still waiting for the left diastolic value.
    let replies = send(&store, &archive, &gate, text("80"));
    assert!(replies[0].text.contains("ПУЛЬС"));
}

#[test]
fn write_outage_keeps_the_reading_and_the_invariant() {
    let (store, archive, gate) = fixture();

    send(&store, &archive, &gate, IntentKind::StartMorning);
    archive.set_fail_writes(true);
    let mut last = Vec::new();
    for value in ["120", "80", "70", "118", "76", "68"] {
        last = send(&store, &archive, &gate, text(value));
    }

    // The user gets the summary plus the pending notice; nothing is lost.
    assert_eq!(last[0].kind, OutboundKind::CompletionSummary);
    assert!(last[0].text.contains("не потеряны"));
    assert_eq!(store.pending_count(), 1);

    // A duplicate morning entry cannot start during the outage.
    let replies = send(&store, &archive, &gate, IntentKind::StartMorning);
    assert_eq!(replies[0].kind, OutboundKind::AlreadyMeasured);

    archive.set_fail_writes(false);
    assert_eq!(store.flush_pending(archive.as_ref()), 1);
    assert_eq!(archive.rows().len(), 1);
    assert_eq!(store.pending_count(), 0);
}

#[test]
fn evening_and_morning_are_independent_slots() {
    let (store, archive, gate) = fixture();

    send(&store, &archive, &gate, IntentKind::StartMorning);
    for value in ["120", "80", "70", "118", "76", "68"] {
        send(&store, &archive, &gate, text(value));
    }

    let replies = send(&store, &archive, &gate, IntentKind::StartEvening);
    assert_eq!(replies[0].kind, OutboundKind::PromptNextField);
    assert!(replies[0].text.contains("Вечернее измерение"));
}
