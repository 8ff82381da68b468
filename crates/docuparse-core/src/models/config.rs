//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DocuparseError;

/// Main configuration for the docuparse pipeline.
///
/// Secrets (API keys, archive token) are deliberately absent: they are
/// read from the environment by the caller, never persisted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocuparseConfig {
    /// Extraction service configuration.
    pub extraction: ExtractionConfig,

    /// Archival service configuration.
    pub archive: ArchiveConfig,

    /// Ledger file configuration.
    pub ledger: LedgerConfig,
}

/// Extraction service (Anthropic Messages API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Model identifier to request.
    pub model: String,

    /// Maximum tokens for the extraction reply.
    pub max_tokens: u32,

    /// API base URL.
    pub api_base: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "claude-opus-4-5-20251101".to_string(),
            max_tokens: 2048,
            api_base: "https://api.anthropic.com".to_string(),
        }
    }
}

/// Archival service (Paperless-ngx) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Upload documents after processing.
    pub enabled: bool,

    /// Base URL of the archive instance. The `PAPERLESS_URL` environment
    /// variable takes precedence when set.
    pub base_url: Option<String>,

    /// Upload timeout in seconds.
    pub timeout_secs: u64,

    /// Correspondent ID to assign to uploaded documents.
    pub correspondent: Option<i64>,

    /// Document type ID to assign.
    pub document_type: Option<i64>,

    /// Storage path ID to assign.
    pub storage_path: Option<i64>,

    /// Tag IDs to assign.
    pub tags: Vec<i64>,

    /// Custom field ID that receives the bill total.
    pub total_field_id: Option<i64>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            timeout_secs: 30,
            correspondent: None,
            document_type: None,
            storage_path: None,
            tags: Vec::new(),
            total_field_id: Some(1),
        }
    }
}

/// Ledger file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path of the JSON ledger that accumulates processed bills.
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bills.json"),
        }
    }
}

impl DocuparseConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            DocuparseError::Config(format!("{}: {}", path.display(), e))
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DocuparseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocuparseConfig::default();
        assert_eq!(config.extraction.max_tokens, 2048);
        assert_eq!(config.archive.timeout_secs, 30);
        assert!(config.archive.enabled);
        assert_eq!(config.ledger.path, PathBuf::from("bills.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: DocuparseConfig =
            serde_json::from_str(r#"{"archive": {"enabled": false}}"#).unwrap();
        assert!(!config.archive.enabled);
        assert_eq!(config.archive.timeout_secs, 30);
        assert_eq!(config.extraction.max_tokens, 2048);
    }

    #[test]
    fn test_from_file_missing_reports_io() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocuparseConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(DocuparseError::Io(_))));
    }

    #[test]
    fn test_from_file_invalid_json_reports_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        match DocuparseConfig::from_file(&path) {
            Err(DocuparseError::Config(msg)) => assert!(msg.contains("config.json")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocuparseConfig::default();
        config.archive.timeout_secs = 90;
        config.save(&path).unwrap();

        let loaded = DocuparseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.archive.timeout_secs, 90);
    }
}
