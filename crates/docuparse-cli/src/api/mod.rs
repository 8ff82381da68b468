//! Thin clients for the external extraction and archival services.

pub mod archive;
pub mod extraction;

pub use archive::{ArchiveClient, DocumentMetadata, UploadError};
pub use extraction::{ExtractionClient, ExtractionError};
