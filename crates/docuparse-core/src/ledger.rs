//! Persisted ledger of processed bills.
//!
//! A single JSON file holding an array of entries - deliberately a
//! whole-file format so the backup guard can snapshot and restore it
//! byte-for-byte. Callers wrap every append in a [`crate::BackupGuard`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;
use crate::models::bill::{BillRecord, LineItem, ValidationVerdict};

/// One archived bill in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Source document file name.
    pub source: String,

    pub store: String,
    pub category: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,

    pub items: Vec<LineItem>,

    /// Validation outcome; `None` when the bill was not validatable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// Task id returned by the archival service, when uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_task_id: Option<String>,
}

impl LedgerEntry {
    /// Build an entry from a decoded bill and its validation verdict.
    pub fn from_bill(
        source: impl Into<String>,
        bill: &BillRecord,
        verdict: Option<&ValidationVerdict>,
    ) -> Self {
        Self {
            source: source.into(),
            store: bill.store.clone(),
            category: bill.category.clone(),
            date: bill.date,
            total: bill.total,
            items: bill.items.clone(),
            valid: verdict.map(|v| v.is_valid),
            archive_task_id: None,
        }
    }
}

/// Handle on the ledger file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger (and parent directories) if none exists,
    /// so the backup guard always has a file to snapshot.
    pub fn ensure_exists(&self) -> Result<(), LedgerError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        self.write(&[])
    }

    /// Read all entries.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let content = fs::read_to_string(&self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LedgerError::Format {
            path: self.path.clone(),
            source,
        })
    }

    /// Append one entry (read-modify-write of the whole file).
    pub fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let mut entries = self.entries()?;
        entries.push(entry);
        self.write(&entries)?;
        debug!(
            "ledger {} now holds {} entries",
            self.path.display(),
            entries.len()
        );
        Ok(())
    }

    /// Record the archival task id on the most recently appended entry.
    pub fn record_archive_task(&self, task_id: &str) -> Result<(), LedgerError> {
        let mut entries = self.entries()?;
        if let Some(last) = entries.last_mut() {
            last.archive_task_id = Some(task_id.to_string());
            self.write(&entries)?;
        }
        Ok(())
    }

    fn write(&self, entries: &[LedgerEntry]) -> Result<(), LedgerError> {
        let content = serde_json::to_string_pretty(entries).map_err(|source| {
            LedgerError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
