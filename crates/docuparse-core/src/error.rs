//! Error types for the docuparse-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docuparse library.
#[derive(Error, Debug)]
pub enum DocuparseError {
    /// Extraction response decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Ledger backup/restore error.
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),

    /// Ledger file error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors produced while decoding an extraction-service response.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The service classified the document as not being a receipt.
    /// This is a skip, not a failure.
    #[error("the extraction service classified this document as not a bill")]
    NotABill,

    /// No recoverable JSON object in the response text.
    #[error("no recoverable bill data in response: {0}")]
    Malformed(String),
}

/// Errors related to the backup/restore guard around ledger mutations.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The backup snapshot could not be created. The guarded mutation
    /// must not proceed when this occurs.
    #[error("failed to back up {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The target could not be restored from its snapshot.
    #[error("failed to restore {path} from {backup}: {source}")]
    Restore {
        path: PathBuf,
        backup: PathBuf,
        source: std::io::Error,
    },

    /// The snapshot could not be removed after a successful mutation.
    #[error("failed to remove backup {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors related to the persisted ledger file.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger file could not be read or written.
    #[error("I/O error on ledger {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The ledger file does not contain a valid JSON array of entries.
    #[error("invalid ledger format in {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for the docuparse library.
pub type Result<T> = std::result::Result<T, DocuparseError>;
