//! Archival service client (Paperless-ngx REST API).

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

use docuparse_core::ArchiveConfig;

/// Errors from the archival upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The PDF could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Transport-level failure, including the 30 s timeout.
    #[error("archive request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service rejected the upload.
    #[error("archive service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl UploadError {
    /// True when the request expired against the bounded upload timeout.
    /// The caller surfaces this as retryable-by-user, not a crash.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

/// Optional metadata attached to an uploaded document.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    /// Creation date/time, e.g. "2025-12-19".
    pub created: Option<String>,
    pub correspondent: Option<i64>,
    pub document_type: Option<i64>,
    pub storage_path: Option<i64>,
    pub tags: Vec<i64>,
    pub archive_serial_number: Option<i64>,
    /// Custom field assignments, field id → value.
    pub custom_fields: Option<serde_json::Value>,
}

/// Client for the document archive.
pub struct ArchiveClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ArchiveClient {
    pub fn new(
        config: &ArchiveConfig,
        base_url: String,
        token: String,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent("docuparse-cli/0.1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Upload a PDF with its metadata via multipart POST.
    ///
    /// Returns the opaque consumption-task identifier the archive hands
    /// back for tracking the ingestion.
    pub async fn upload(
        &self,
        pdf_path: &Path,
        metadata: &DocumentMetadata,
    ) -> Result<String, UploadError> {
        let pdf_bytes = fs::read(pdf_path).map_err(|source| UploadError::Read {
            path: pdf_path.display().to_string(),
            source,
        })?;
        let file_name = pdf_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let document = Part::bytes(pdf_bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let mut form = Form::new().part("document", document);

        if let Some(title) = &metadata.title {
            form = form.text("title", title.clone());
        }
        if let Some(created) = &metadata.created {
            form = form.text("created", created.clone());
        }
        if let Some(correspondent) = metadata.correspondent {
            form = form.text("correspondent", correspondent.to_string());
        }
        if let Some(document_type) = metadata.document_type {
            form = form.text("document_type", document_type.to_string());
        }
        if let Some(storage_path) = metadata.storage_path {
            form = form.text("storage_path", storage_path.to_string());
        }
        if !metadata.tags.is_empty() {
            // Tags travel as a comma-separated id list.
            let tags = metadata
                .tags
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(",");
            form = form.text("tags", tags);
        }
        if let Some(asn) = metadata.archive_serial_number {
            form = form.text("archive_serial_number", asn.to_string());
        }
        if let Some(custom_fields) = &metadata.custom_fields {
            form = form.text("custom_fields", custom_fields.to_string());
        }

        debug!("uploading {} to archive", pdf_path.display());
        let response = self
            .http
            .post(format!("{}/api/documents/post_document/", self.base_url))
            .header("Authorization", format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        // The API returns the task UUID as a JSON string; some versions
        // wrap it in an object instead.
        let task: serde_json::Value = response.json().await?;
        Ok(match task {
            serde_json::Value::String(uuid) => uuid,
            other => other
                .get("task_id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        })
    }
}
