//! Error types for scanning and dataset resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning directories or resolving a
/// patient's file set.
///
/// Unparseable or irrelevant files are NOT errors — classification drops
/// them silently. A parse failure of a file whose class was recognized is a
/// hard error: that patient's data cannot be trusted.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A recognized file failed to parse; aborts this patient's preparation.
    #[error("corrupt dataset: {source}")]
    CorruptDataset {
        #[source]
        source: onco_dicom::DicomError,
    },
}

impl From<onco_dicom::DicomError> for IngestError {
    fn from(source: onco_dicom::DicomError) -> Self {
        Self::CorruptDataset { source }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
