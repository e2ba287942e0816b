//! Dataset handle: a parsed DICOM object plus the path it came from.

use std::path::{Path, PathBuf};

use dicom::core::Tag;
use dicom::object::meta::FileMetaTableBuilder;
use dicom::object::{InMemDicomObject, open_file};
use dicom_dictionary_std::tags;

use crate::error::{DicomError, Result};
use crate::meta::trim_uid;

/// Explicit VR Little Endian, used for everything this tool writes.
pub const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

/// A resolved dataset: the in-memory object and its source path.
///
/// Steps read and mutate datasets through this handle; the path is kept for
/// traceable side-effect writes next to the source data.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    obj: InMemDicomObject,
}

impl Dataset {
    /// Fully parses a DICOM file. Failure here is a hard error; callers
    /// only reach this point for files whose class was already recognized.
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_file(path).map_err(|source| DicomError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            obj: (*file).clone(),
        })
    }

    /// Wraps an object built in memory (new SR/RTSS output, test fixtures).
    pub fn from_parts(path: impl Into<PathBuf>, obj: InMemDicomObject) -> Self {
        Self {
            path: path.into(),
            obj,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn object(&self) -> &InMemDicomObject {
        &self.obj
    }

    pub fn object_mut(&mut self) -> &mut InMemDicomObject {
        &mut self.obj
    }

    /// Writes the dataset as a part-10 file with a fresh meta group.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let sop_class = self.require_string(tags::SOP_CLASS_UID, "writing dataset")?;
        let sop_instance = self.require_string(tags::SOP_INSTANCE_UID, "writing dataset")?;
        let builder = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(sop_class)
            .media_storage_sop_instance_uid(sop_instance)
            .transfer_syntax(EXPLICIT_VR_LE);
        let file_obj = self
            .obj
            .clone()
            .with_meta(builder)
            .map_err(|e| DicomError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        file_obj.write_to_file(path).map_err(|e| DicomError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // ---- tolerant accessors -------------------------------------------------

    pub fn string(&self, tag: Tag) -> Option<String> {
        let element = self.obj.element(tag).ok()?;
        let value = element.to_str().ok()?;
        let trimmed = trim_uid(value.trim());
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }

    pub fn f64(&self, tag: Tag) -> Option<f64> {
        self.obj.element(tag).ok()?.to_float64().ok()
    }

    pub fn f64s(&self, tag: Tag) -> Option<Vec<f64>> {
        self.obj.element(tag).ok()?.to_multi_float64().ok()
    }

    pub fn i64(&self, tag: Tag) -> Option<i64> {
        self.obj.element(tag).ok()?.to_int::<i64>().ok()
    }

    pub fn items(&self, tag: Tag) -> Option<&[InMemDicomObject]> {
        self.obj.element(tag).ok()?.items()
    }

    // ---- strict accessors ---------------------------------------------------

    pub fn require_string(&self, tag: Tag, context: &'static str) -> Result<String> {
        self.string(tag).ok_or_else(|| DicomError::MissingElement {
            tag: format!("{tag}"),
            context,
        })
    }

    pub fn require_f64(&self, tag: Tag, context: &'static str) -> Result<f64> {
        self.f64(tag).ok_or_else(|| DicomError::MissingElement {
            tag: format!("{tag}"),
            context,
        })
    }

    // ---- common identity fields --------------------------------------------

    pub fn sop_class_uid(&self) -> Option<String> {
        self.string(tags::SOP_CLASS_UID)
    }

    pub fn sop_instance_uid(&self) -> Option<String> {
        self.string(tags::SOP_INSTANCE_UID)
    }

    pub fn series_instance_uid(&self) -> Option<String> {
        self.string(tags::SERIES_INSTANCE_UID)
    }

    pub fn patient_id(&self) -> Option<String> {
        self.string(tags::PATIENT_ID)
    }

    pub fn modality(&self) -> Option<String> {
        self.string(tags::MODALITY)
    }

    /// Z component of ImagePositionPatient, the anatomical sort key.
    pub fn slice_position(&self) -> Option<f64> {
        self.f64s(tags::IMAGE_POSITION_PATIENT)
            .and_then(|pos| pos.get(2).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{ds_element, str_element};
    use dicom::core::VR;

    fn synthetic() -> Dataset {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(str_element(
            tags::SOP_CLASS_UID,
            VR::UI,
            "1.2.840.10008.5.1.4.1.1.2",
        ));
        obj.put(str_element(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3.4\0"));
        obj.put(ds_element(tags::IMAGE_POSITION_PATIENT, [0.0, 0.0, -12.5]));
        Dataset::from_parts("mem", obj)
    }

    #[test]
    fn string_access_trims_padding() {
        let ds = synthetic();
        assert_eq!(ds.series_instance_uid().unwrap(), "1.2.3.4");
    }

    #[test]
    fn missing_elements_are_none() {
        let ds = synthetic();
        assert!(ds.patient_id().is_none());
        assert!(ds.require_string(tags::PATIENT_ID, "test").is_err());
    }

    #[test]
    fn slice_position_reads_z() {
        let ds = synthetic();
        assert_eq!(ds.slice_position(), Some(-12.5));
    }
}
