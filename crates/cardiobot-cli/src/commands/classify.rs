use cardiobot_core::{SettingsStore, Thresholds};

pub fn run(
    systolic: u16,
    diastolic: u16,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let thresholds = match user {
        Some(user_id) => SettingsStore::open_default()?.get(&user_id)?.thresholds,
        None => Thresholds::default(),
    };
    thresholds.validate()?;

    let classification = thresholds.classify(systolic, diastolic);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "systolic": systolic,
            "diastolic": diastolic,
            "classification": classification,
            "thresholds": thresholds,
        }))?
    );
    Ok(())
}
