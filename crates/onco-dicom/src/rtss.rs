//! Structure-set access and rewriting.
//!
//! The three parallel sequences of an RT Structure Set (StructureSetROI,
//! ROIContour, RTROIObservations) are kept consistent through every edit:
//! renames touch only names, removals drop the ROI from all three, appends
//! add to all three with the next free ROI number.

use std::collections::BTreeMap;

use dicom::core::VR;
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;

use crate::access::{item_i64, item_items, item_str};
use crate::dataset::Dataset;
use crate::values::{ds_element, is_element, seq_element, str_element};

const RTSS_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.481.3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiEntry {
    pub number: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Contour {
    pub geometric_type: String,
    /// Patient-space points, `[x, y, z]` per vertex.
    pub points: Vec<[f64; 3]>,
}

/// A ROI to append, with its contours already in patient space.
#[derive(Debug, Clone)]
pub struct NewRoi {
    pub name: String,
    pub interpreted_type: String,
    pub contours: Vec<Contour>,
}

/// The image series this structure set was drawn over, per
/// ReferencedFrameOfReferenceSequence → RTReferencedStudySequence →
/// RTReferencedSeriesSequence.
pub fn referenced_series_uid(ds: &Dataset) -> Option<String> {
    let frames = ds.items(tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE)?;
    for frame in frames {
        for study in item_items(frame, tags::RT_REFERENCED_STUDY_SEQUENCE) {
            for series in item_items(study, tags::RT_REFERENCED_SERIES_SEQUENCE) {
                if let Some(uid) = item_str(series, tags::SERIES_INSTANCE_UID) {
                    return Some(uid);
                }
            }
        }
    }
    None
}

pub fn roi_entries(ds: &Dataset) -> Vec<RoiEntry> {
    ds.items(tags::STRUCTURE_SET_ROI_SEQUENCE)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(RoiEntry {
                        number: item_i64(item, tags::ROI_NUMBER)?,
                        name: item_str(item, tags::ROI_NAME)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn contours_for_roi(ds: &Dataset, roi_number: i64) -> Vec<Contour> {
    let Some(roi_contours) = ds.items(tags::ROI_CONTOUR_SEQUENCE) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for roi in roi_contours {
        if item_i64(roi, tags::REFERENCED_ROI_NUMBER) != Some(roi_number) {
            continue;
        }
        for contour in item_items(roi, tags::CONTOUR_SEQUENCE) {
            let geometric_type = item_str(contour, tags::CONTOUR_GEOMETRIC_TYPE)
                .unwrap_or_else(|| "CLOSED_PLANAR".to_string());
            let data = contour
                .element(tags::CONTOUR_DATA)
                .ok()
                .and_then(|element| element.to_multi_float64().ok())
                .unwrap_or_default();
            let points = data
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            out.push(Contour {
                geometric_type,
                points,
            });
        }
    }
    out
}

fn rewrite_sequence<F>(ds: &mut Dataset, tag: dicom::core::Tag, mut edit: F)
where
    F: FnMut(Vec<InMemDicomObject>) -> Vec<InMemDicomObject>,
{
    let items: Vec<InMemDicomObject> = ds.items(tag).map(<[_]>::to_vec).unwrap_or_default();
    let items = edit(items);
    ds.object_mut().put(seq_element(tag, items));
}

/// Renames ROIs per the `old name → new name` map. Returns how many were
/// renamed.
pub fn rename_rois(ds: &mut Dataset, renames: &BTreeMap<String, String>) -> usize {
    let mut renamed = 0;
    rewrite_sequence(ds, tags::STRUCTURE_SET_ROI_SEQUENCE, |items| {
        items
            .into_iter()
            .map(|mut item| {
                if let Some(name) = item_str(&item, tags::ROI_NAME)
                    && let Some(new_name) = renames.get(&name)
                {
                    item.put(str_element(tags::ROI_NAME, VR::LO, new_name.clone()));
                    renamed += 1;
                }
                item
            })
            .collect()
    });
    renamed
}

/// Removes the named ROIs from all three structure-set sequences. Returns
/// how many ROI entries were removed.
pub fn remove_rois(ds: &mut Dataset, names: &[String]) -> usize {
    let doomed: Vec<i64> = roi_entries(ds)
        .into_iter()
        .filter(|entry| names.contains(&entry.name))
        .map(|entry| entry.number)
        .collect();
    if doomed.is_empty() {
        return 0;
    }

    rewrite_sequence(ds, tags::STRUCTURE_SET_ROI_SEQUENCE, |items| {
        items
            .into_iter()
            .filter(|item| {
                item_i64(item, tags::ROI_NUMBER).is_none_or(|n| !doomed.contains(&n))
            })
            .collect()
    });
    rewrite_sequence(ds, tags::ROI_CONTOUR_SEQUENCE, |items| {
        items
            .into_iter()
            .filter(|item| {
                item_i64(item, tags::REFERENCED_ROI_NUMBER).is_none_or(|n| !doomed.contains(&n))
            })
            .collect()
    });
    rewrite_sequence(ds, tags::RTROI_OBSERVATIONS_SEQUENCE, |items| {
        items
            .into_iter()
            .filter(|item| {
                item_i64(item, tags::REFERENCED_ROI_NUMBER).is_none_or(|n| !doomed.contains(&n))
            })
            .collect()
    });
    doomed.len()
}

/// Appends new ROIs, keeping the three sequences consistent.
pub fn append_rois(ds: &mut Dataset, frame_of_reference_uid: &str, rois: &[NewRoi]) {
    let mut next_number = roi_entries(ds)
        .iter()
        .map(|entry| entry.number)
        .max()
        .unwrap_or(0)
        + 1;

    for roi in rois {
        let number = next_number;
        next_number += 1;

        rewrite_sequence(ds, tags::STRUCTURE_SET_ROI_SEQUENCE, |mut items| {
            let mut item = InMemDicomObject::new_empty();
            item.put(is_element(tags::ROI_NUMBER, number));
            item.put(str_element(tags::ROI_NAME, VR::LO, roi.name.clone()));
            item.put(str_element(
                tags::REFERENCED_FRAME_OF_REFERENCE_UID,
                VR::UI,
                frame_of_reference_uid,
            ));
            item.put(str_element(
                tags::ROI_GENERATION_ALGORITHM,
                VR::CS,
                "AUTOMATIC",
            ));
            items.push(item);
            items
        });

        rewrite_sequence(ds, tags::ROI_CONTOUR_SEQUENCE, |mut items| {
            let contour_items: Vec<InMemDicomObject> = roi
                .contours
                .iter()
                .map(|contour| {
                    let mut item = InMemDicomObject::new_empty();
                    item.put(str_element(
                        tags::CONTOUR_GEOMETRIC_TYPE,
                        VR::CS,
                        contour.geometric_type.clone(),
                    ));
                    item.put(is_element(
                        tags::NUMBER_OF_CONTOUR_POINTS,
                        contour.points.len() as i64,
                    ));
                    item.put(ds_element(
                        tags::CONTOUR_DATA,
                        contour.points.iter().flat_map(|p| p.iter().copied()),
                    ));
                    item
                })
                .collect();
            let mut item = InMemDicomObject::new_empty();
            item.put(is_element(tags::REFERENCED_ROI_NUMBER, number));
            item.put(seq_element(tags::CONTOUR_SEQUENCE, contour_items));
            items.push(item);
            items
        });

        rewrite_sequence(ds, tags::RTROI_OBSERVATIONS_SEQUENCE, |mut items| {
            let mut item = InMemDicomObject::new_empty();
            item.put(is_element(tags::OBSERVATION_NUMBER, number));
            item.put(is_element(tags::REFERENCED_ROI_NUMBER, number));
            item.put(str_element(
                tags::ROI_OBSERVATION_LABEL,
                VR::SH,
                roi.name.clone(),
            ));
            item.put(str_element(
                tags::RTROI_INTERPRETED_TYPE,
                VR::CS,
                roi.interpreted_type.clone(),
            ));
            items.push(item);
            items
        });
    }
}

/// Builds a minimal structure-set skeleton over the given image series.
pub fn new_rtss(
    patient_id: &str,
    frame_of_reference_uid: &str,
    study_uid: &str,
    series_uid: &str,
    label: &str,
) -> Dataset {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(str_element(tags::SOP_CLASS_UID, VR::UI, RTSS_SOP_CLASS_UID));
    obj.put(str_element(tags::SOP_INSTANCE_UID, VR::UI, crate::uid::new_uid()));
    obj.put(str_element(tags::PATIENT_ID, VR::LO, patient_id));
    obj.put(str_element(tags::MODALITY, VR::CS, "RTSTRUCT"));
    obj.put(str_element(tags::STRUCTURE_SET_LABEL, VR::SH, label));
    obj.put(str_element(tags::STUDY_INSTANCE_UID, VR::UI, study_uid));
    obj.put(str_element(
        tags::SERIES_INSTANCE_UID,
        VR::UI,
        crate::uid::new_uid(),
    ));
    obj.put(str_element(
        tags::FRAME_OF_REFERENCE_UID,
        VR::UI,
        frame_of_reference_uid,
    ));

    let mut series_item = InMemDicomObject::new_empty();
    series_item.put(str_element(tags::SERIES_INSTANCE_UID, VR::UI, series_uid));
    let mut study_item = InMemDicomObject::new_empty();
    study_item.put(str_element(
        tags::REFERENCED_SOP_INSTANCE_UID,
        VR::UI,
        study_uid,
    ));
    study_item.put(seq_element(
        tags::RT_REFERENCED_SERIES_SEQUENCE,
        vec![series_item],
    ));
    let mut frame_item = InMemDicomObject::new_empty();
    frame_item.put(str_element(
        tags::FRAME_OF_REFERENCE_UID,
        VR::UI,
        frame_of_reference_uid,
    ));
    frame_item.put(seq_element(
        tags::RT_REFERENCED_STUDY_SEQUENCE,
        vec![study_item],
    ));
    obj.put(seq_element(
        tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
        vec![frame_item],
    ));

    obj.put(seq_element(tags::STRUCTURE_SET_ROI_SEQUENCE, Vec::new()));
    obj.put(seq_element(tags::ROI_CONTOUR_SEQUENCE, Vec::new()));
    obj.put(seq_element(tags::RTROI_OBSERVATIONS_SEQUENCE, Vec::new()));

    Dataset::from_parts("generated", obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rtss_with_rois() -> Dataset {
        let mut ds = new_rtss("P1", "1.9.8", "1.2.3", "1.2.3.4", "test set");
        append_rois(
            &mut ds,
            "1.9.8",
            &[
                NewRoi {
                    name: "PTV".into(),
                    interpreted_type: "PTV".into(),
                    contours: vec![Contour {
                        geometric_type: "CLOSED_PLANAR".into(),
                        points: vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
                    }],
                },
                NewRoi {
                    name: "Lung_L".into(),
                    interpreted_type: "ORGAN".into(),
                    contours: Vec::new(),
                },
            ],
        );
        ds
    }

    #[test]
    fn referenced_series_is_traversed() {
        let ds = rtss_with_rois();
        assert_eq!(referenced_series_uid(&ds).unwrap(), "1.2.3.4");
    }

    #[test]
    fn append_assigns_sequential_numbers() {
        let ds = rtss_with_rois();
        let entries = roi_entries(&ds);
        assert_eq!(
            entries,
            vec![
                RoiEntry {
                    number: 1,
                    name: "PTV".into()
                },
                RoiEntry {
                    number: 2,
                    name: "Lung_L".into()
                },
            ]
        );
    }

    #[test]
    fn contours_round_trip() {
        let ds = rtss_with_rois();
        let contours = contours_for_roi(&ds, 1);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].geometric_type, "CLOSED_PLANAR");
        assert_eq!(contours[0].points.len(), 3);
        assert_eq!(contours[0].points[2], [1.0, 1.0, 1.0]);
        assert!(contours_for_roi(&ds, 2).is_empty());
    }

    #[test]
    fn rename_touches_only_matches() {
        let mut ds = rtss_with_rois();
        let mut renames = BTreeMap::new();
        renames.insert("PTV".to_string(), "PTV_7000".to_string());
        assert_eq!(rename_rois(&mut ds, &renames), 1);
        let names: Vec<String> = roi_entries(&ds).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["PTV_7000", "Lung_L"]);
    }

    #[test]
    fn remove_drops_all_three_sequences() {
        let mut ds = rtss_with_rois();
        assert_eq!(remove_rois(&mut ds, &["PTV".to_string()]), 1);
        assert_eq!(roi_entries(&ds).len(), 1);
        assert!(contours_for_roi(&ds, 1).is_empty());
        let observations = ds.items(tags::RTROI_OBSERVATIONS_SEQUENCE).unwrap();
        assert_eq!(observations.len(), 1);
    }
}
