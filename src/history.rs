// Bounded query history persisted as a single JSON array

use crate::error::{BaziError, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Records kept on disk; older ones are evicted first.
pub const HISTORY_CAPACITY: usize = 100;

/// Records returned by the history listing.
pub const HISTORY_TAIL: usize = 20;

/// One past fortune query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: NaiveDateTime,
    pub birth_date: NaiveDate,
    pub fortune: u8,
    pub wealth: u8,
}

impl HistoryRecord {
    /// Record stamped with the current local time.
    pub fn new(birth_date: NaiveDate, fortune: u8, wealth: u8) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            birth_date,
            fortune,
            wealth,
        }
    }
}

/// Aggregates over the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub avg_fortune: f64,
    pub avg_wealth: f64,
}

impl Statistics {
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        if records.is_empty() {
            return Statistics {
                total: 0,
                avg_fortune: 0.0,
                avg_wealth: 0.0,
            };
        }

        let total = records.len();
        let fortune: f64 = records.iter().map(|r| f64::from(r.fortune)).sum();
        let wealth: f64 = records.iter().map(|r| f64::from(r.wealth)).sum();

        Statistics {
            total,
            avg_fortune: round1(fortune / total as f64),
            avg_wealth: round1(wealth / total as f64),
        }
    }
}

/// One decimal, ties to even (58.25 -> 58.2).
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Append-only history file.
///
/// Every append reloads the file, adds the record, drops the oldest entries
/// beyond capacity and rewrites the file. The whole sequence runs under one
/// lock, so appends from the same process never lose each other's records.
/// Separate processes sharing a file still race (last writer wins).
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, HISTORY_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Full log, oldest first. A missing or unreadable file reads as empty.
    pub fn load(&self) -> Vec<HistoryRecord> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Cannot read history {:?}, treating as empty: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<HistoryRecord>>(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!("Corrupt history {:?}, treating as empty: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Append one record and persist; returns the log length afterwards.
    pub fn append(&self, record: HistoryRecord) -> Result<usize> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut records = self.load();
        records.push(record);
        if records.len() > self.capacity {
            let excess = records.len() - self.capacity;
            records.drain(..excess);
            debug!("Evicted {} oldest history records", excess);
        }

        self.persist(&records)?;
        Ok(records.len())
    }

    /// The `n` most recent records, oldest first.
    pub fn tail(&self, n: usize) -> Vec<HistoryRecord> {
        let mut records = self.load();
        let start = records.len().saturating_sub(n);
        records.split_off(start)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::from_records(&self.load())
    }

    /// Write the full log as CSV; returns the number of rows.
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<usize> {
        let records = self.load();
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &records {
            csv_writer.serialize(record).map_err(|e| self.storage_error(e.into()))?;
        }
        csv_writer.flush().map_err(|e| self.storage_error(e))?;
        Ok(records.len())
    }

    // Written to a sibling temp file first so readers never see a partial array.
    fn persist(&self, records: &[HistoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }

        let tmp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let json = serde_json::to_vec_pretty(records).map_err(|e| self.storage_error(e.into()))?;

        fs::write(&tmp, json).map_err(|e| self.storage_error(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.storage_error(e));
        }
        Ok(())
    }

    fn storage_error(&self, source: io::Error) -> BaziError {
        BaziError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}
