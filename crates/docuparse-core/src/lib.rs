//! Core library for AI-assisted receipt processing.
//!
//! This crate provides:
//! - Decoding of free-form extraction-service replies into typed bill records
//! - Locale-aware price and date normalization (comma decimals, day-first dates)
//! - Arithmetic validation of line items against the declared total
//! - Crash-safe ledger mutation via timestamped backup/restore guards

pub mod error;
pub mod models;
pub mod normalize;
pub mod decode;
pub mod validate;
pub mod backup;
pub mod ledger;

pub use error::{DocuparseError, DecodeError, BackupError, LedgerError, Result};
pub use models::bill::{BillRecord, LineItem, PriceValue, ValidationVerdict};
pub use models::config::{DocuparseConfig, ExtractionConfig, ArchiveConfig, LedgerConfig};
pub use decode::{decode, NOT_A_BILL_SENTINEL};
pub use validate::validate;
pub use backup::BackupGuard;
pub use ledger::{Ledger, LedgerEntry};
