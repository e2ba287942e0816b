//! File classification against a role table.
//!
//! Classification is two-phase: the file meta group is sniffed first so the
//! SOP class can be checked against the role table without parsing the whole
//! dataset. Files that fail the sniff, or whose class is not in the table,
//! are dropped silently. A file whose class IS in the table is then fully
//! parsed; failure at that point is a hard error, because a corrupt
//! recognized dataset means this patient's data cannot be interpreted.

use std::path::{Path, PathBuf};

use tracing::debug;

use onco_dicom::{Dataset, rtss, sniff_file_meta};
use onco_model::{FileRole, RoleTable};

use crate::error::Result;
use crate::natural::sort_paths_natural;

/// A file accepted by classification, with the fields resolution needs.
#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    pub role: FileRole,
    pub sliceable: bool,
    pub series_uid: Option<String>,
    /// For reference-sensitive roles: the image series this file points at.
    pub referenced_series_uid: Option<String>,
    pub dataset: Dataset,
}

impl ClassifiedFile {
    /// Builds the classification record from an already-parsed dataset.
    pub fn from_dataset(role: FileRole, sliceable: bool, dataset: Dataset) -> Self {
        let series_uid = dataset.series_instance_uid();
        let referenced_series_uid = if role.is_reference_sensitive() {
            rtss::referenced_series_uid(&dataset)
        } else {
            None
        };
        Self {
            role,
            sliceable,
            series_uid,
            referenced_series_uid,
            dataset,
        }
    }
}

/// Classifies an unordered bag of paths against a role table.
///
/// Paths are natural-sorted first; the output order is the acceptance order
/// that sliceable numbering is built from.
pub fn classify_paths(paths: &[&Path], table: &RoleTable) -> Result<Vec<ClassifiedFile>> {
    let mut ordered: Vec<PathBuf> = paths.iter().map(|p| p.to_path_buf()).collect();
    sort_paths_natural(&mut ordered);

    let mut classified = Vec::new();
    for path in &ordered {
        let Some(meta) = sniff_file_meta(path) else {
            debug!(path = %path.display(), "not a readable DICOM file, skipping");
            continue;
        };
        let Some(entry) = table.lookup(&meta.sop_class_uid) else {
            debug!(
                path = %path.display(),
                sop_class = %meta.sop_class_uid,
                "class not in role table, ignoring"
            );
            continue;
        };
        // Recognized class: a parse failure from here on is fatal for this
        // patient's preparation.
        let dataset = Dataset::open(path)?;
        classified.push(ClassifiedFile::from_dataset(
            entry.role,
            entry.sliceable,
            dataset,
        ));
    }
    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unreadable_files_are_skipped_silently() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"not dicom")
            .unwrap();
        let table = RoleTable::ct_rt();
        let paths = [path.as_path()];
        let classified = classify_paths(&paths, &table).unwrap();
        assert!(classified.is_empty());
    }

    #[test]
    fn from_dataset_extracts_reference_for_rtss() {
        let ds = onco_dicom::rtss::new_rtss("P1", "1.9", "1.2.3", "1.2.3.4", "set");
        let classified = ClassifiedFile::from_dataset(FileRole::Rtss, false, ds);
        assert_eq!(classified.referenced_series_uid.as_deref(), Some("1.2.3.4"));
    }
}
