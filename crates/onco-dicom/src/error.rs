//! Error types for the DICOM format layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DicomError {
    /// A file whose class was recognized could not be fully parsed. This is
    /// a hard error: the dataset cannot be trusted at all.
    #[error("failed to read DICOM file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: dicom::object::ReadError,
    },

    #[error("failed to write DICOM file {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// A tag required by the operation is absent from the dataset.
    #[error("missing required element {tag} ({context})")]
    MissingElement { tag: String, context: &'static str },

    /// An element exists but its value cannot be converted as required.
    #[error("invalid value for element {tag}: {message}")]
    InvalidValue { tag: String, message: String },

    #[error("pixel data is malformed: {0}")]
    PixelData(String),
}

pub type Result<T> = std::result::Result<T, DicomError>;
