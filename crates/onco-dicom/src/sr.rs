//! Structured reports carrying clinical-data text payloads.
//!
//! Clinical data travels with the imaging record as a text SR whose series
//! description marks it as clinical data; the payload is a CSV-shaped text
//! value in the content sequence.

use dicom::core::VR;
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;

use crate::dataset::Dataset;
use crate::uid::new_uid;
use crate::values::{seq_element, str_element};

const COMPREHENSIVE_SR_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.88.33";

/// Series description marking a clinical-data report.
pub const CLINICAL_DATA_SERIES: &str = "CLINICAL-DATA";

/// Builds a text SR holding one payload string.
pub fn build_text_sr(
    patient_id: &str,
    study_uid: &str,
    series_description: &str,
    text: &str,
) -> Dataset {
    let mut content = InMemDicomObject::new_empty();
    content.put(str_element(tags::VALUE_TYPE, VR::CS, "TEXT"));
    content.put(str_element(tags::TEXT_VALUE, VR::UT, text));

    let mut obj = InMemDicomObject::new_empty();
    obj.put(str_element(
        tags::SOP_CLASS_UID,
        VR::UI,
        COMPREHENSIVE_SR_SOP_CLASS_UID,
    ));
    obj.put(str_element(tags::SOP_INSTANCE_UID, VR::UI, new_uid()));
    obj.put(str_element(tags::PATIENT_ID, VR::LO, patient_id));
    obj.put(str_element(tags::MODALITY, VR::CS, "SR"));
    obj.put(str_element(tags::STUDY_INSTANCE_UID, VR::UI, study_uid));
    obj.put(str_element(tags::SERIES_INSTANCE_UID, VR::UI, new_uid()));
    obj.put(str_element(
        tags::SERIES_DESCRIPTION,
        VR::LO,
        series_description,
    ));
    obj.put(str_element(tags::COMPLETION_FLAG, VR::CS, "COMPLETE"));
    obj.put(str_element(tags::VERIFICATION_FLAG, VR::CS, "UNVERIFIED"));
    obj.put(seq_element(tags::CONTENT_SEQUENCE, vec![content]));

    Dataset::from_parts("generated", obj)
}

/// Extracts the concatenated text payload of an SR, walking nested content.
pub fn text_payload(ds: &Dataset) -> Option<String> {
    let items = ds.items(tags::CONTENT_SEQUENCE)?;
    let mut parts = Vec::new();
    for item in items {
        collect_text(item, &mut parts);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

fn collect_text(item: &InMemDicomObject, parts: &mut Vec<String>) {
    if let Ok(element) = item.element(tags::TEXT_VALUE)
        && let Ok(value) = element.to_str()
    {
        let trimmed = value.trim_end_matches(['\0', ' ']).to_string();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    if let Ok(element) = item.element(tags::CONTENT_SEQUENCE)
        && let Some(children) = element.items()
    {
        for child in children {
            collect_text(child, parts);
        }
    }
}

/// Whether this SR carries the clinical-data payload.
pub fn is_clinical_data_sr(ds: &Dataset) -> bool {
    ds.string(tags::SERIES_DESCRIPTION).as_deref() == Some(CLINICAL_DATA_SERIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let sr = build_text_sr("P1", "1.2.3", CLINICAL_DATA_SERIES, "age,stage\n61,II");
        assert!(is_clinical_data_sr(&sr));
        assert_eq!(text_payload(&sr).unwrap(), "age,stage\n61,II");
    }

    #[test]
    fn other_series_descriptions_are_not_clinical_data() {
        let sr = build_text_sr("P1", "1.2.3", "DOSE-REPORT", "x");
        assert!(!is_clinical_data_sr(&sr));
    }

    #[test]
    fn missing_content_yields_none() {
        let mut sr = build_text_sr("P1", "1.2.3", CLINICAL_DATA_SERIES, "x");
        sr.object_mut().put(seq_element(tags::CONTENT_SEQUENCE, Vec::new()));
        assert!(text_payload(&sr).is_none());
    }
}
