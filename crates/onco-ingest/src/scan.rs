//! Directory scanning into patient records.
//!
//! Walks a directory tree, reads the identity fields of every DICOM file it
//! can parse, and groups them into the Patient → Study → SeriesGroup →
//! Series hierarchy. Files that cannot be parsed are skipped; at scan time
//! nothing has been classified yet, so nothing is trusted yet either.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use onco_dicom::{Dataset, sniff_file_meta};
use onco_model::{ImageFile, PatientRecord, Series, SeriesGroup, Study};

use crate::error::{IngestError, Result};
use crate::natural::sort_paths_natural;

/// Scans a directory tree and groups every readable DICOM file by patient.
pub fn scan_directory(root: &Path) -> Result<Vec<PatientRecord>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    sort_paths_natural(&mut files);

    // patient → study → modality → series → images
    type SeriesMap = BTreeMap<String, Vec<ImageFile>>;
    type ModalityMap = BTreeMap<String, SeriesMap>;
    type StudyMap = BTreeMap<String, ModalityMap>;
    let mut patients: BTreeMap<String, StudyMap> = BTreeMap::new();

    for path in &files {
        if sniff_file_meta(path).is_none() {
            continue;
        }
        let Ok(ds) = Dataset::open(path) else {
            debug!(path = %path.display(), "unreadable DICOM file skipped during scan");
            continue;
        };
        let patient_id = ds.patient_id().unwrap_or_else(|| "UNKNOWN".to_string());
        let study_uid = ds
            .string(dicom_dictionary_std::tags::STUDY_INSTANCE_UID)
            .unwrap_or_default();
        let modality = ds.modality().unwrap_or_default();
        let series_uid = ds.series_instance_uid().unwrap_or_default();
        let sop_instance_uid = ds.sop_instance_uid().unwrap_or_default();

        patients
            .entry(patient_id)
            .or_default()
            .entry(study_uid)
            .or_default()
            .entry(modality)
            .or_default()
            .entry(series_uid)
            .or_default()
            .push(ImageFile {
                sop_instance_uid,
                path: path.clone(),
            });
    }

    let records: Vec<PatientRecord> = patients
        .into_iter()
        .map(|(patient_id, studies)| PatientRecord {
            patient_id,
            studies: studies
                .into_iter()
                .map(|(study_uid, modalities)| Study {
                    study_uid,
                    series_groups: modalities
                        .into_iter()
                        .map(|(modality, series)| SeriesGroup {
                            modality,
                            series: series
                                .into_iter()
                                .map(|(series_uid, images)| Series { series_uid, images })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    info!(
        patients = records.len(),
        files = files.len(),
        "directory scan complete"
    );
    Ok(records)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry_result in entries {
        let entry = entry_result.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_an_error() {
        let err = scan_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
    }

    #[test]
    fn non_dicom_files_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/data.csv"), "a,b\n1,2").unwrap();
        let records = scan_directory(dir.path()).unwrap();
        assert!(records.is_empty());
    }
}
