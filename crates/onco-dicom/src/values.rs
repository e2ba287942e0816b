//! Element construction helpers.
//!
//! Centralizes the handful of `DataElement` shapes this tool writes so step
//! code never builds primitive values by hand.

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::InMemDicomObject;

/// The element type stored in an in-memory object.
pub type Element = dicom::object::mem::InMemElement;

pub fn str_element(tag: Tag, vr: VR, value: impl Into<String>) -> Element {
    DataElement::new(tag, vr, PrimitiveValue::from(value.into()))
}

/// Multi-valued string element (each entry is one value).
pub fn strs_element(tag: Tag, vr: VR, values: impl IntoIterator<Item = String>) -> Element {
    DataElement::new(
        tag,
        vr,
        PrimitiveValue::Strs(values.into_iter().collect()),
    )
}

/// Decimal-string element from floats, one value per float.
pub fn ds_element(tag: Tag, values: impl IntoIterator<Item = f64>) -> Element {
    strs_element(tag, VR::DS, values.into_iter().map(format_ds))
}

/// Integer-string element.
pub fn is_element(tag: Tag, value: i64) -> Element {
    str_element(tag, VR::IS, value.to_string())
}

pub fn seq_element(tag: Tag, items: Vec<InMemDicomObject>) -> Element {
    DataElement::new(tag, VR::SQ, DataSetSequence::from(items))
}

/// DS output: shortest representation that round-trips the value within the
/// 16-byte DS limit.
pub fn format_ds(value: f64) -> String {
    let mut text = format!("{value:.6}");
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text.len() > 16 {
        text.truncate(16);
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_dictionary_std::tags;

    #[test]
    fn ds_formatting_is_compact() {
        assert_eq!(format_ds(1.0), "1");
        assert_eq!(format_ds(-12.5), "-12.5");
        assert_eq!(format_ds(0.123456), "0.123456");
    }

    #[test]
    fn ds_element_round_trips_floats() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(ds_element(
            tags::IMAGE_POSITION_PATIENT,
            [0.0, 0.0, -12.5],
        ));
        let read = obj
            .element(tags::IMAGE_POSITION_PATIENT)
            .unwrap()
            .to_multi_float64()
            .unwrap();
        assert_eq!(read, vec![0.0, 0.0, -12.5]);
    }

    #[test]
    fn seq_element_exposes_items() {
        let mut item = InMemDicomObject::new_empty();
        item.put(str_element(tags::ROI_NAME, VR::LO, "PTV"));
        let mut obj = InMemDicomObject::new_empty();
        obj.put(seq_element(tags::STRUCTURE_SET_ROI_SEQUENCE, vec![item]));
        let items = obj
            .element(tags::STRUCTURE_SET_ROI_SEQUENCE)
            .unwrap()
            .items()
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
