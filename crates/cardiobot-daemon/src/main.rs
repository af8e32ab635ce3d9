//! CardioBot daemon.
//!
//! Two worker loops over one core. The intent loop long-polls Telegram and
//! routes normalized intents through the session store; the scheduler loop
//! evaluates the reminder slots once per interval and drives the
//! pending-write flush with backoff. Both loops consult the archive through
//! fresh gate reads, so a reading completed in one loop is visible to the
//! other on its next pass.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cardiobot_core::{
    MeasurementGate, PreferencesReader, RetryBackoff, ReminderScheduler, SessionStore,
    SettingsStore,
};

mod config;
mod sheets;
mod telegram;

use config::Config;
use sheets::SheetsArchive;
use telegram::{InboundEvent, TelegramClient};

fn main() {
    init_logging();

    if let Err(err) = run() {
        error!(error = %err, "daemon failed to start");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?.with_env_overrides();
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let user_id = config.telegram.user_id.clone();
    let settings = SettingsStore::open_default()?;
    // Fatal misconfiguration stops the daemon before either loop starts.
    settings.preferences(&user_id)?;

    let archive = Arc::new(SheetsArchive::new(&config.sheets, runtime.handle().clone())?);
    let gate = MeasurementGate::new(archive.clone());
    let store = Arc::new(SessionStore::new());
    let telegram = Arc::new(TelegramClient::new(
        &config.telegram,
        runtime.handle().clone(),
    )?);

    info!(user_id = %user_id, "cardiobot daemon starting");

    let scheduler_thread = {
        let store = store.clone();
        let gate = gate.clone();
        let archive = archive.clone();
        let telegram = telegram.clone();
        let settings = settings.clone();
        let user_id = user_id.clone();
        let interval = config.scheduler.poll_interval_secs;
        thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || {
                scheduler_loop(store, gate, archive, telegram, settings, user_id, interval)
            })?
    };

    let intent_thread = {
        thread::Builder::new()
            .name("intents".into())
            .spawn(move || intent_loop(store, gate, archive, telegram, settings))?
    };

    // Both loops run until the process is stopped.
    let _ = intent_thread.join();
    let _ = scheduler_thread.join();
    Ok(())
}

/// Reactive loop: Telegram updates in, session store replies out.
fn intent_loop(
    store: Arc<SessionStore>,
    gate: MeasurementGate,
    archive: Arc<SheetsArchive>,
    telegram: Arc<TelegramClient>,
    settings: SettingsStore,
) {
    loop {
        let events = match telegram.poll_events() {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "update poll failed");
                thread::sleep(Duration::from_secs(5));
                continue;
            }
        };

        for event in events {
            match event {
                InboundEvent::Help { user_id } => {
                    if let Err(err) = telegram.send_text(&user_id, telegram::HELP_TEXT) {
                        warn!(error = %err, "help reply failed");
                    }
                }
                InboundEvent::Intent(intent) => {
                    let prefs = match settings.preferences(&intent.user_id) {
                        Ok(prefs) => prefs,
                        Err(err) => {
                            error!(error = %err, "preferences unreadable, intent dropped");
                            continue;
                        }
                    };
                    for reply in store.dispatch(&intent, &prefs, &gate, archive.as_ref()) {
                        if let Err(err) = telegram.send(&reply) {
                            warn!(error = %err, "reply delivery failed");
                        }
                    }
                }
            }
        }
    }
}

/// Time-driven loop: one scheduler pass per interval, then a retry of any
/// readings the archive refused earlier.
fn scheduler_loop(
    store: Arc<SessionStore>,
    gate: MeasurementGate,
    archive: Arc<SheetsArchive>,
    telegram: Arc<TelegramClient>,
    settings: SettingsStore,
    user_id: String,
    poll_interval_secs: u64,
) {
    let mut scheduler = ReminderScheduler::new(user_id.clone(), poll_interval_secs);
    let mut backoff = RetryBackoff::default();
    info!(poll_interval_secs, "scheduler loop running");

    loop {
        match settings.preferences(&user_id) {
            Ok(prefs) => {
                for reminder in scheduler.pass(Utc::now(), &prefs, &gate) {
                    if let Err(err) = telegram.send(&reminder) {
                        warn!(error = %err, "reminder delivery failed");
                    }
                }
            }
            Err(err) => warn!(error = %err, "preferences unreadable, pass skipped"),
        }

        if store.pending_count() > 0 && backoff.ready(Utc::now()) {
            store.flush_pending(archive.as_ref());
            if store.pending_count() == 0 {
                backoff.reset();
            } else {
                backoff.record_failure(Utc::now());
            }
        }

        thread::sleep(Duration::from_secs(poll_interval_secs));
    }
}
