//! Patient hierarchy produced by the directory scan.
//!
//! Owned by the scan; read-only to the batch core.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct PatientRecord {
    pub patient_id: String,
    pub studies: Vec<Study>,
}

#[derive(Debug, Clone, Default)]
pub struct Study {
    pub study_uid: String,
    pub series_groups: Vec<SeriesGroup>,
}

/// Series of one modality inside a study.
#[derive(Debug, Clone, Default)]
pub struct SeriesGroup {
    pub modality: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Default)]
pub struct Series {
    pub series_uid: String,
    pub images: Vec<ImageFile>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageFile {
    pub sop_instance_uid: String,
    pub path: PathBuf,
}

impl PatientRecord {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            studies: Vec::new(),
        }
    }

    /// Flattens the hierarchy into the unordered bag of file paths the
    /// resolver starts from.
    pub fn all_paths(&self) -> Vec<&Path> {
        self.studies
            .iter()
            .flat_map(|study| &study.series_groups)
            .flat_map(|group| &group.series)
            .flat_map(|series| &series.images)
            .map(|image| image.path.as_path())
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.studies
            .iter()
            .flat_map(|study| &study.series_groups)
            .flat_map(|group| &group.series)
            .map(|series| series.images.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_paths_flattens_the_hierarchy() {
        let record = PatientRecord {
            patient_id: "P1".into(),
            studies: vec![Study {
                study_uid: "1.2.3".into(),
                series_groups: vec![SeriesGroup {
                    modality: "CT".into(),
                    series: vec![Series {
                        series_uid: "1.2.3.4".into(),
                        images: vec![
                            ImageFile {
                                sop_instance_uid: "1.2.3.4.1".into(),
                                path: PathBuf::from("a.dcm"),
                            },
                            ImageFile {
                                sop_instance_uid: "1.2.3.4.2".into(),
                                path: PathBuf::from("b.dcm"),
                            },
                        ],
                    }],
                }],
            }],
        };
        assert_eq!(record.file_count(), 2);
        assert_eq!(record.all_paths().len(), 2);
    }
}
