//! Google Sheets archive adapter.
//!
//! One appended row per reading: date, slot, the six values, capture
//! timestamp. `exists` reads the date and slot columns back and scans for
//! the pair; the sheet itself is the source of truth the gate reads
//! through.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Handle;
use tracing::debug;

use cardiobot_core::error::ArchiveError;
use cardiobot_core::{ArchiveReader, ArchiveWriter, Reading, Slot};

use crate::config::SheetsConfig;

const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsArchive {
    http: reqwest::Client,
    handle: Handle,
    api_base: String,
    spreadsheet_id: String,
    access_token: String,
    range: String,
    timeout_secs: u64,
}

impl SheetsArchive {
    pub fn new(config: &SheetsConfig, handle: Handle) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            handle,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            access_token: config.access_token.clone(),
            range: config.range.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.api_base,
            self.spreadsheet_id,
            urlencoding::encode(&self.range),
            suffix,
        )
    }

    fn map_err(&self, err: reqwest::Error) -> ArchiveError {
        if err.is_timeout() {
            ArchiveError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            ArchiveError::Unavailable(err.to_string())
        }
    }
}

impl ArchiveWriter for SheetsArchive {
    fn append(&self, reading: &Reading) -> Result<(), ArchiveError> {
        let url = self.values_url(":append");
        let body = json!({
            "values": [[
                reading.day.format(DATE_FORMAT).to_string(),
                reading.slot.as_str(),
                reading.left.systolic,
                reading.left.diastolic,
                reading.left.pulse,
                reading.right.systolic,
                reading.right.diastolic,
                reading.right.pulse,
                reading.captured_at.to_rfc3339(),
            ]]
        });

        let response = self
            .handle
            .block_on(async {
                self.http
                    .post(&url)
                    .bearer_auth(&self.access_token)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body)
                    .send()
                    .await
            })
            .map_err(|e| self.map_err(e))?;

        if !response.status().is_success() {
            return Err(ArchiveError::Rejected(format!(
                "append answered HTTP {}",
                response.status()
            )));
        }
        debug!(slot = reading.slot.as_str(), %reading.day, "reading appended");
        Ok(())
    }
}

impl ArchiveReader for SheetsArchive {
    fn exists(&self, _user_id: &str, day: NaiveDate, slot: Slot) -> Result<bool, ArchiveError> {
        let url = self.values_url("");

        let response = self
            .handle
            .block_on(async {
                self.http
                    .get(&url)
                    .bearer_auth(&self.access_token)
                    .send()
                    .await
            })
            .map_err(|e| self.map_err(e))?;

        if !response.status().is_success() {
            return Err(ArchiveError::Rejected(format!(
                "values read answered HTTP {}",
                response.status()
            )));
        }

        let parsed: ValuesResponse = self
            .handle
            .block_on(response.json())
            .map_err(|e| self.map_err(e))?;

        let date = day.format(DATE_FORMAT).to_string();
        Ok(parsed.values.iter().any(|row| {
            row.first().and_then(|v| v.as_str()) == Some(date.as_str())
                && row.get(1).and_then(|v| v.as_str()) == Some(slot.as_str())
        }))
    }
}
