//! Archive collaborator traits and the write-retry backoff.
//!
//! The archive is the external spreadsheet. The core only sees these two
//! traits; the HTTP adapter lives in the daemon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::ArchiveError;
use crate::reading::{Reading, Slot};

/// Appends completed readings to the external archive.
///
/// Implementations must bound each call with a timeout; a hung archive
/// surfaces as [`ArchiveError::Timeout`], never as a blocked caller.
pub trait ArchiveWriter: Send + Sync {
    fn append(&self, reading: &Reading) -> Result<(), ArchiveError>;
}

/// Answers whether a reading is already archived for a day and slot.
pub trait ArchiveReader: Send + Sync {
    fn exists(&self, user_id: &str, day: NaiveDate, slot: Slot) -> Result<bool, ArchiveError>;
}

/// In-memory archive for tests and the local simulator.
///
/// Failure injection flips the next calls into `ArchiveError::Unavailable`
/// so fail-closed paths can be exercised without a network.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    rows: Mutex<Vec<Reading>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Reading> {
        self.rows.lock().unwrap().clone()
    }
}

impl ArchiveWriter for MemoryArchive {
    fn append(&self, reading: &Reading) -> Result<(), ArchiveError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ArchiveError::Unavailable("injected write failure".into()));
        }
        self.rows.lock().unwrap().push(reading.clone());
        Ok(())
    }
}

impl ArchiveReader for MemoryArchive {
    fn exists(&self, user_id: &str, day: NaiveDate, slot: Slot) -> Result<bool, ArchiveError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ArchiveError::Unavailable("injected read failure".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.user_id == user_id && r.day == day && r.slot == slot))
    }
}

/// Exponential backoff state for retrying queued archive writes.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    step_secs: u64,
    max_secs: u64,
    failures: u32,
    next_at: Option<DateTime<Utc>>,
}

impl RetryBackoff {
    pub fn new(step_secs: u64, max_secs: u64) -> Self {
        Self {
            step_secs,
            max_secs,
            failures: 0,
            next_at: None,
        }
    }

    /// Whether a retry attempt is allowed at `now`.
    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        self.next_at.map_or(true, |at| now >= at)
    }

    /// Record a failed attempt and push the next retry out.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failures = self.failures.saturating_add(1);
        let shift = u32::min(self.failures.saturating_sub(1), 16);
        let delay_secs = u64::min(
            self.step_secs.checked_shl(shift).unwrap_or(u64::MAX),
            self.max_secs,
        );
        self.next_at = Some(now + Duration::seconds(delay_secs as i64));
    }

    /// Clear the ladder after a successful flush.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.next_at = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(30, 15 * 60)
    }
}
