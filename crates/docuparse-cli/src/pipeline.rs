//! Per-document processing pipeline.
//!
//! Each document runs to completion before the next begins: extraction
//! call → decode → validate → guarded ledger append → archive upload.
//! The ledger mutation is wrapped in a backup guard held until the
//! upload either succeeds (commit) or fails (rollback), so an upload
//! failure never leaves a ledger entry behind.

use std::future::Future;
use std::path::Path;

use anyhow::Context;
use serde_json::json;
use tracing::{error, info, warn};

use docuparse_core::{
    BackupError, BackupGuard, BillRecord, DecodeError, DocuparseConfig, Ledger, LedgerEntry,
    LedgerError, ValidationVerdict, decode, validate,
};

use crate::api::{ArchiveClient, DocumentMetadata, ExtractionClient, UploadError};

/// Final state of one processed document.
pub enum DocumentOutcome {
    /// Decoded and recorded; uploaded when an archive is configured.
    Archived {
        bill: BillRecord,
        verdict: Option<ValidationVerdict>,
        task_id: Option<String>,
    },

    /// The extraction service classified the document as a non-receipt.
    NotABill,

    /// A stage failed; the ledger was left untouched or rolled back.
    Failed {
        stage: &'static str,
        message: String,
    },
}

impl DocumentOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn failed(stage: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Failed {
            stage,
            message: error.to_string(),
        }
    }
}

/// Shared state for a processing run.
pub struct Pipeline {
    config: DocuparseConfig,
    extraction: ExtractionClient,
    archive: Option<ArchiveClient>,
    ledger: Ledger,
}

impl Pipeline {
    /// Build the pipeline from configuration and environment secrets
    /// (`ANTHROPIC_API_KEY`, `PAPERLESS_URL`, `PAPERLESS_API_TOKEN`).
    pub fn from_config(config: DocuparseConfig, upload_enabled: bool) -> anyhow::Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable is not set")?;
        let extraction = ExtractionClient::new(&config.extraction, api_key)?;

        let archive = if upload_enabled && config.archive.enabled {
            let base_url = std::env::var("PAPERLESS_URL")
                .ok()
                .or_else(|| config.archive.base_url.clone());
            let token = std::env::var("PAPERLESS_API_TOKEN").ok();
            match (base_url, token) {
                (Some(base_url), Some(token)) => {
                    Some(ArchiveClient::new(&config.archive, base_url, token)?)
                }
                _ => {
                    warn!(
                        "archive upload disabled: PAPERLESS_URL or PAPERLESS_API_TOKEN not set"
                    );
                    None
                }
            }
        } else {
            None
        };

        let ledger = Ledger::new(config.ledger.path.clone());
        Ok(Self {
            config,
            extraction,
            archive,
            ledger,
        })
    }

    /// Process a single receipt PDF to completion.
    ///
    /// Never returns an `Err`: every failure is folded into the outcome
    /// so one bad document cannot halt a batch.
    pub async fn process_document(&self, pdf_path: &Path) -> DocumentOutcome {
        let source = pdf_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        info!("processing {}", source);

        let response_text = match self.extraction.analyze_pdf(pdf_path).await {
            Ok(text) => text,
            Err(e) => return DocumentOutcome::failed("extract", e),
        };

        let bill = match decode(&response_text) {
            Ok(bill) => bill,
            Err(DecodeError::NotABill) => {
                info!("{}: not a bill, skipping", source);
                return DocumentOutcome::NotABill;
            }
            Err(e) => return DocumentOutcome::failed("decode", e),
        };

        let verdict = validate(&bill);
        match &verdict {
            Some(v) if v.is_valid => info!("{}: {}", source, v.message),
            Some(v) => warn!(
                "{}: {} (sum {} vs total {})",
                source, v.message, v.calculated_sum, v.declared_total
            ),
            // Indeterminate validation is a warning; the document is
            // still recorded and archived.
            None => warn!("{}: bill has no validatable items/total", source),
        }

        // Ledger mutation under backup protection, held across the
        // upload so an upload failure rolls the append back.
        let entry = LedgerEntry::from_bill(&source, &bill, verdict.as_ref());
        let metadata = self.archive_metadata(&bill);
        let archive = self.archive.as_ref();
        let upload = move || async move {
            match archive {
                Some(client) => client.upload(pdf_path, &metadata).await.map(Some),
                None => Ok(None),
            }
        };

        let task_id = match guarded_archive(&self.ledger, entry, upload).await {
            Ok(task_id) => task_id,
            Err(ArchiveStepError::Ledger(e)) => return DocumentOutcome::failed("ledger", e),
            Err(ArchiveStepError::Backup(e)) => return DocumentOutcome::failed("backup", e),
            Err(ArchiveStepError::Upload(e)) => {
                let message = if e.is_timeout() {
                    format!(
                        "upload timed out after {}s; re-run this document",
                        self.config.archive.timeout_secs
                    )
                } else {
                    e.to_string()
                };
                return DocumentOutcome::Failed {
                    stage: "upload",
                    message,
                };
            }
        };
        if let Some(task_id) = &task_id {
            info!("{}: archived as task {}", source, task_id);
        }

        DocumentOutcome::Archived {
            bill,
            verdict,
            task_id,
        }
    }

    /// Derive archive metadata from the decoded bill.
    fn archive_metadata(&self, bill: &BillRecord) -> DocumentMetadata {
        let title = match bill.date {
            Some(date) => format!("{} {}", bill.store, date),
            None => bill.store.clone(),
        };

        let custom_fields = match (self.config.archive.total_field_id, bill.total) {
            (Some(field_id), Some(total)) => {
                Some(json!({ field_id.to_string(): total.to_string() }))
            }
            _ => None,
        };

        DocumentMetadata {
            title: Some(title),
            created: bill.date.map(|d| d.to_string()),
            correspondent: self.config.archive.correspondent,
            document_type: self.config.archive.document_type,
            storage_path: self.config.archive.storage_path,
            tags: self.config.archive.tags.clone(),
            archive_serial_number: None,
            custom_fields,
        }
    }
}

/// What went wrong inside the guarded append-then-upload step.
pub(crate) enum ArchiveStepError {
    Ledger(LedgerError),
    Backup(BackupError),
    Upload(UploadError),
}

/// Append `entry` to the ledger and run `upload` with a backup guard held
/// across both. Any failure rolls the ledger back to its prior bytes; a
/// returned task id is written into the appended entry before the guard
/// commits.
pub(crate) async fn guarded_archive<Fut>(
    ledger: &Ledger,
    entry: LedgerEntry,
    upload: impl FnOnce() -> Fut,
) -> Result<Option<String>, ArchiveStepError>
where
    Fut: Future<Output = Result<Option<String>, UploadError>>,
{
    ledger.ensure_exists().map_err(ArchiveStepError::Ledger)?;
    let guard = BackupGuard::begin(ledger.path()).map_err(ArchiveStepError::Backup)?;

    if let Err(e) = ledger.append(entry) {
        rollback_logged(guard);
        return Err(ArchiveStepError::Ledger(e));
    }

    let task_id = match upload().await {
        Ok(task_id) => task_id,
        Err(e) => {
            rollback_logged(guard);
            return Err(ArchiveStepError::Upload(e));
        }
    };

    if let Some(task_id) = &task_id {
        if let Err(e) = ledger.record_archive_task(task_id) {
            rollback_logged(guard);
            return Err(ArchiveStepError::Ledger(e));
        }
    }

    if let Err(e) = guard.commit() {
        warn!("could not remove ledger backup: {}", e);
    }
    Ok(task_id)
}

fn rollback_logged(guard: BackupGuard) {
    if let Err(e) = guard.rollback() {
        error!("ledger rollback failed: {}", e);
    }
}
