//! Local conversation simulation.
//!
//! Drives the full session store against an in-memory archive, printing
//! exactly what the bot would send. Useful for trying threshold settings
//! without a bot token or a spreadsheet.

use std::io::BufRead;
use std::sync::Arc;

use chrono::Utc;

use cardiobot_core::{
    Intent, IntentKind, MeasurementGate, MemoryArchive, SessionStore, UserSettings,
};

const LOCAL_USER: &str = "local";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let archive = Arc::new(MemoryArchive::new());
    let gate = MeasurementGate::new(archive.clone());
    let store = SessionStore::new();
    let prefs = UserSettings::default().to_preferences()?;

    println!("CardioBot simulator. Commands: /morning, /evening, /cancel, quit.");
    println!();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        let kind = match trimmed {
            "/morning" => IntentKind::StartMorning,
            "/evening" => IntentKind::StartEvening,
            "/cancel" => IntentKind::Cancel,
            other => IntentKind::TextInput {
                text: other.to_string(),
            },
        };

        let intent = Intent::new(LOCAL_USER, kind, Utc::now());
        for reply in store.dispatch(&intent, &prefs, &gate, archive.as_ref()) {
            println!("{}", reply.text);
            println!();
        }
    }

    println!("{} reading(s) archived this run.", archive.rows().len());
    Ok(())
}
