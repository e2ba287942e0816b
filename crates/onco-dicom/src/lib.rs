pub mod access;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod meta;
pub mod rtss;
pub mod sr;
pub mod uid;
pub mod values;

pub use dataset::{Dataset, EXPLICIT_VR_LE};
pub use error::{DicomError, Result};
pub use grid::PixelGrid;
pub use meta::{FileMetaSummary, sniff_file_meta};
pub use uid::new_uid;
