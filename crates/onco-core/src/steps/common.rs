//! Helpers shared by the step implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dicom::core::VR;
use dicom_dictionary_std::tags;

use onco_dicom::values::str_element;
use onco_dicom::{Dataset, PixelGrid, new_uid, rtss, sr};
use onco_ingest::ResolvedFileSet;
use onco_model::FileRole;

use crate::calc::geometry::point_in_polygon;
use crate::context::PatientContext;

/// Clinical data as parallel header/value rows, parsed from the patient's
/// clinical-data structured report.
pub fn clinical_data_from_sr(resolved: &ResolvedFileSet) -> Option<(Vec<String>, Vec<String>)> {
    let report = resolved.singleton(FileRole::Sr)?;
    if !sr::is_clinical_data_sr(report) {
        return None;
    }
    let payload = sr::text_payload(report)?;
    parse_clinical_payload(&payload)
}

/// The payload is CSV-shaped: a header line and one value line.
pub fn parse_clinical_payload(payload: &str) -> Option<(Vec<String>, Vec<String>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(payload.as_bytes());
    let mut lines = reader.records();
    let header: Vec<String> = lines.next()?.ok()?.iter().map(str::to_string).collect();
    let values: Vec<String> = lines.next()?.ok()?.iter().map(str::to_string).collect();
    if header.is_empty() || values.is_empty() {
        return None;
    }
    Some((header, values))
}

/// A contour flattened to its plane: z plus (x, y) vertices.
pub struct PlanarContour {
    pub z: f64,
    pub vertices: Vec<(f64, f64)>,
}

pub fn planar_contour(contour: &rtss::Contour) -> Option<PlanarContour> {
    let first = contour.points.first()?;
    Some(PlanarContour {
        z: first[2],
        vertices: contour.points.iter().map(|p| (p[0], p[1])).collect(),
    })
}

/// Collects grid samples whose pixel centers fall inside the polygon, from
/// one frame of a grid.
pub fn samples_in_polygon(grid: &PixelGrid, frame: usize, polygon: &[(f64, f64)]) -> Vec<f64> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let min_x = polygon.iter().map(|p| p.0).fold(f64::MAX, f64::min);
    let max_x = polygon.iter().map(|p| p.0).fold(f64::MIN, f64::max);
    let min_y = polygon.iter().map(|p| p.1).fold(f64::MAX, f64::min);
    let max_y = polygon.iter().map(|p| p.1).fold(f64::MIN, f64::max);

    let (row_lo, col_lo) = grid.point_to_index(min_x, min_y);
    let (row_hi, col_hi) = grid.point_to_index(max_x, max_y);
    let row_range = clamp_range(row_lo, row_hi, grid.rows);
    let col_range = clamp_range(col_lo, col_hi, grid.cols);

    let mut samples = Vec::new();
    for row in row_range {
        for col in col_range.clone() {
            let (x, y) = grid.index_to_point(row, col);
            if point_in_polygon(x, y, polygon)
                && let Some(value) = grid.value_at(frame, row, col)
            {
                samples.push(value);
            }
        }
    }
    samples
}

fn clamp_range(lo: f64, hi: f64, len: usize) -> std::ops::Range<usize> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let start = lo.floor().max(0.0) as usize;
    let end = (hi.ceil() as i64 + 1).clamp(0, len as i64) as usize;
    start.min(len)..end
}

/// Nearest dose-grid frame to a contour plane, within half a frame step.
pub fn nearest_frame(grid: &PixelGrid, z: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for frame in 0..grid.frames {
        let distance = (grid.frame_z(frame) - z).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((frame, distance));
        }
    }
    let (frame, distance) = best?;
    let step = if grid.frames > 1 {
        (grid.frame_z(1) - grid.frame_z(0)).abs().max(f64::EPSILON)
    } else {
        f64::MAX
    };
    (distance <= step / 2.0 + f64::EPSILON).then_some(frame)
}

/// Nearest image slice to a contour plane.
pub fn nearest_slice(slices: &[Dataset], z: f64) -> Option<&Dataset> {
    slices
        .iter()
        .filter_map(|ds| ds.slice_position().map(|position| (ds, (position - z).abs())))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(ds, _)| ds)
}

/// Writes a regenerated structure set under the step's output directory
/// with a fresh SOP instance UID, and returns the path.
pub fn write_rtss_output(
    ctx: &PatientContext<'_>,
    step: &str,
    dataset: &mut Dataset,
) -> Result<PathBuf> {
    dataset
        .object_mut()
        .put(str_element(tags::SOP_INSTANCE_UID, VR::UI, new_uid()));
    let dir = ctx.step_output_dir(step);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create step output directory {}", dir.display()))?;
    let path = dir.join("rtss.dcm");
    dataset
        .write_to(&path)
        .with_context(|| format!("write structure set {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinical_payload_parses_two_lines() {
        let (header, values) =
            parse_clinical_payload("patient_id,age,stage\nP1,61,\"II,b\"").unwrap();
        assert_eq!(header, vec!["patient_id", "age", "stage"]);
        assert_eq!(values, vec!["P1", "61", "II,b"]);
    }

    #[test]
    fn clinical_payload_requires_two_lines() {
        assert!(parse_clinical_payload("only_header").is_none());
        assert!(parse_clinical_payload("").is_none());
    }
}
