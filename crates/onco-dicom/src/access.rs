//! Read helpers for sequence items.

use dicom::core::Tag;
use dicom::object::InMemDicomObject;

use crate::meta::trim_uid;

pub fn item_str(item: &InMemDicomObject, tag: Tag) -> Option<String> {
    let value = item.element(tag).ok()?.to_str().ok()?;
    let trimmed = trim_uid(value.trim());
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

pub fn item_f64(item: &InMemDicomObject, tag: Tag) -> Option<f64> {
    item.element(tag).ok()?.to_float64().ok()
}

pub fn item_i64(item: &InMemDicomObject, tag: Tag) -> Option<i64> {
    item.element(tag).ok()?.to_int::<i64>().ok()
}

pub fn item_items<'a>(item: &'a InMemDicomObject, tag: Tag) -> &'a [InMemDicomObject] {
    item.element(tag)
        .ok()
        .and_then(|element| element.items())
        .unwrap_or(&[])
}
