//! Scaled pixel grids for dose, CT and PET datasets.
//!
//! Grids are read from the native little-endian PIXEL_DATA element; the
//! scanned archives this tool serves store RT dose and image slices
//! uncompressed. Values are exposed already scaled (dose grid scaling, or
//! rescale slope/intercept).

use dicom_dictionary_std::tags;

use crate::dataset::Dataset;
use crate::error::{DicomError, Result};

#[derive(Debug, Clone)]
pub struct PixelGrid {
    pub rows: usize,
    pub cols: usize,
    pub frames: usize,
    /// Frame-major scaled values, `frames * rows * cols` long.
    values: Vec<f64>,
    /// ImagePositionPatient of the first frame.
    pub position: [f64; 3],
    /// PixelSpacing as stored: `[row_spacing, col_spacing]`.
    pub spacing: [f64; 2],
    /// Per-frame z offsets (GridFrameOffsetVector); empty for single frames.
    pub frame_offsets: Vec<f64>,
}

impl PixelGrid {
    /// Reads an RTDOSE grid, applying DoseGridScaling.
    pub fn from_dose(ds: &Dataset) -> Result<Self> {
        let scaling = ds.require_f64(tags::DOSE_GRID_SCALING, "dose grid")?;
        let frame_offsets = ds.f64s(tags::GRID_FRAME_OFFSET_VECTOR).unwrap_or_default();
        Self::read(ds, scaling, 0.0, frame_offsets)
    }

    /// Reads a single image slice, applying RescaleSlope/RescaleIntercept.
    pub fn from_image(ds: &Dataset) -> Result<Self> {
        let slope = ds.f64(tags::RESCALE_SLOPE).unwrap_or(1.0);
        let intercept = ds.f64(tags::RESCALE_INTERCEPT).unwrap_or(0.0);
        Self::read(ds, slope, intercept, Vec::new())
    }

    fn read(ds: &Dataset, scale: f64, offset: f64, frame_offsets: Vec<f64>) -> Result<Self> {
        let rows = ds.i64(tags::ROWS).ok_or(DicomError::MissingElement {
            tag: format!("{}", tags::ROWS),
            context: "pixel grid",
        })? as usize;
        let cols = ds.i64(tags::COLUMNS).ok_or(DicomError::MissingElement {
            tag: format!("{}", tags::COLUMNS),
            context: "pixel grid",
        })? as usize;
        let frames = ds.i64(tags::NUMBER_OF_FRAMES).unwrap_or(1).max(1) as usize;
        let bits_allocated = ds.i64(tags::BITS_ALLOCATED).unwrap_or(16);
        let signed = ds.i64(tags::PIXEL_REPRESENTATION).unwrap_or(0) == 1;

        let position = {
            let pos = ds.f64s(tags::IMAGE_POSITION_PATIENT).unwrap_or_default();
            [
                pos.first().copied().unwrap_or(0.0),
                pos.get(1).copied().unwrap_or(0.0),
                pos.get(2).copied().unwrap_or(0.0),
            ]
        };
        let spacing = {
            let sp = ds.f64s(tags::PIXEL_SPACING).unwrap_or_default();
            [
                sp.first().copied().unwrap_or(1.0),
                sp.get(1).copied().unwrap_or(1.0),
            ]
        };

        let element = ds
            .object()
            .element(tags::PIXEL_DATA)
            .map_err(|_| DicomError::MissingElement {
                tag: format!("{}", tags::PIXEL_DATA),
                context: "pixel grid",
            })?;
        let primitive = element
            .value()
            .primitive()
            .ok_or_else(|| DicomError::PixelData("pixel data is not primitive".into()))?;
        let bytes = primitive.to_bytes();

        let expected = frames * rows * cols;
        let raw = decode_native(&bytes, bits_allocated as usize, signed)?;
        if raw.len() < expected {
            return Err(DicomError::PixelData(format!(
                "expected {expected} samples, found {}",
                raw.len()
            )));
        }

        let values = raw
            .into_iter()
            .take(expected)
            .map(|v| v * scale + offset)
            .collect();

        Ok(Self {
            rows,
            cols,
            frames,
            values,
            position,
            spacing,
            frame_offsets,
        })
    }

    pub fn value_at(&self, frame: usize, row: usize, col: usize) -> Option<f64> {
        if frame >= self.frames || row >= self.rows || col >= self.cols {
            return None;
        }
        self.values
            .get((frame * self.rows + row) * self.cols + col)
            .copied()
    }

    pub fn frame(&self, frame: usize) -> Option<&[f64]> {
        if frame >= self.frames {
            return None;
        }
        let len = self.rows * self.cols;
        self.values.get(frame * len..(frame + 1) * len)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::MIN, f64::max)
    }

    /// Patient z coordinate of a frame.
    pub fn frame_z(&self, frame: usize) -> f64 {
        self.position[2] + self.frame_offsets.get(frame).copied().unwrap_or(0.0)
    }

    /// Grid index → patient (x, y) of the pixel center.
    pub fn index_to_point(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.position[0] + col as f64 * self.spacing[1],
            self.position[1] + row as f64 * self.spacing[0],
        )
    }

    /// Patient (x, y) → fractional grid (row, col).
    pub fn point_to_index(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (y - self.position[1]) / self.spacing[0],
            (x - self.position[0]) / self.spacing[1],
        )
    }
}

fn decode_native(bytes: &[u8], bits_allocated: usize, signed: bool) -> Result<Vec<f64>> {
    match bits_allocated {
        8 => Ok(bytes
            .iter()
            .map(|&b| if signed { b as i8 as f64 } else { b as f64 })
            .collect()),
        16 => Ok(bytes
            .chunks_exact(2)
            .map(|c| {
                let raw = u16::from_le_bytes([c[0], c[1]]);
                if signed { raw as i16 as f64 } else { raw as f64 }
            })
            .collect()),
        32 => Ok(bytes
            .chunks_exact(4)
            .map(|c| {
                let raw = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                if signed { raw as i32 as f64 } else { raw as f64 }
            })
            .collect()),
        other => Err(DicomError::PixelData(format!(
            "unsupported bits allocated: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{ds_element, is_element, str_element};
    use dicom::core::value::PrimitiveValue;
    use dicom::core::{DataElement, VR};
    use dicom::object::InMemDicomObject;

    fn dose_dataset() -> Dataset {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            tags::ROWS,
            VR::US,
            PrimitiveValue::from(2_u16),
        ));
        obj.put(DataElement::new(
            tags::COLUMNS,
            VR::US,
            PrimitiveValue::from(2_u16),
        ));
        obj.put(is_element(tags::NUMBER_OF_FRAMES, 2));
        obj.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(16_u16),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));
        obj.put(str_element(tags::DOSE_GRID_SCALING, VR::DS, "0.5"));
        obj.put(ds_element(tags::GRID_FRAME_OFFSET_VECTOR, [0.0, 3.0]));
        obj.put(ds_element(tags::IMAGE_POSITION_PATIENT, [-1.0, -1.0, 10.0]));
        obj.put(ds_element(tags::PIXEL_SPACING, [2.0, 2.0]));
        let samples: Vec<u8> = [1u16, 2, 3, 4, 5, 6, 7, 8]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U8(samples.into()),
        ));
        Dataset::from_parts("mem", obj)
    }

    #[test]
    fn dose_grid_applies_scaling() {
        let grid = PixelGrid::from_dose(&dose_dataset()).unwrap();
        assert_eq!((grid.frames, grid.rows, grid.cols), (2, 2, 2));
        assert_eq!(grid.value_at(0, 0, 0), Some(0.5));
        assert_eq!(grid.value_at(1, 1, 1), Some(4.0));
        assert_eq!(grid.max_value(), 4.0);
    }

    #[test]
    fn frame_z_uses_offsets() {
        let grid = PixelGrid::from_dose(&dose_dataset()).unwrap();
        assert_eq!(grid.frame_z(0), 10.0);
        assert_eq!(grid.frame_z(1), 13.0);
    }

    #[test]
    fn coordinate_mapping_round_trips() {
        let grid = PixelGrid::from_dose(&dose_dataset()).unwrap();
        let (x, y) = grid.index_to_point(1, 0);
        assert_eq!((x, y), (-1.0, 1.0));
        let (row, col) = grid.point_to_index(x, y);
        assert_eq!((row, col), (1.0, 0.0));
    }

    #[test]
    fn out_of_range_access_is_none() {
        let grid = PixelGrid::from_dose(&dose_dataset()).unwrap();
        assert_eq!(grid.value_at(2, 0, 0), None);
        assert_eq!(grid.value_at(0, 2, 0), None);
    }
}
