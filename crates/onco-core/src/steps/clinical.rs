//! Clinical data import and export.
//!
//! `clinicaldata2csv` extracts the clinical-data SR payload into a
//! batch-wide CSV; `csv2clinicaldatasr` goes the other way, wrapping one
//! patient's CSV row into a structured report stored with the imaging
//! record.

use anyhow::{Context, Result};

use dicom_dictionary_std::tags;
use onco_dicom::sr;
use onco_model::{CancellationToken, FileRole, ReasonCode, RoleTable, StepName, StepOutcome};

use crate::context::PatientContext;
use crate::csvout::{append_rows, column_index, read_rows};
use crate::progress::ProgressSink;
use crate::step::ProcessStep;
use crate::steps::common::clinical_data_from_sr;

pub const CLINICAL_CSV_NAME: &str = "clinical_data.csv";

pub struct ClinicalData2Csv;

impl ProcessStep for ClinicalData2Csv {
    fn name(&self) -> StepName {
        StepName::ClinicalData2Csv
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_sr()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Sr]
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }

        let Some((mut header, mut values)) = clinical_data_from_sr(&ctx.resolved) else {
            return Ok(StepOutcome::failure(ReasonCode::CdNoSr));
        };

        // Ensure the patient id leads the row, whatever the payload had.
        if column_index(&header, "patient_id").is_none() {
            header.insert(0, "patient_id".to_string());
            values.insert(0, ctx.patient_id.clone());
        }

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let path = ctx
            .output_dir
            .join(self.name().as_str())
            .join(CLINICAL_CSV_NAME);
        let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
        append_rows(&path, &header_refs, &[values]).context("append clinical data row")?;
        Ok(StepOutcome::success())
    }
}

pub struct Csv2ClinicalDataSr;

impl ProcessStep for Csv2ClinicalDataSr {
    fn name(&self) -> StepName {
        StepName::Csv2ClinicalDataSr
    }

    fn role_table(&self) -> RoleTable {
        RoleTable::ct_sr()
    }

    fn required_roles(&self) -> &'static [FileRole] {
        &[FileRole::Ct]
    }

    fn run(
        &self,
        ctx: &mut PatientContext<'_>,
        cancel: &CancellationToken,
        _progress: &dyn ProgressSink,
    ) -> Result<StepOutcome> {
        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }

        let Some(source) = &ctx.config.clinical_data_csv else {
            return Ok(StepOutcome::failure(ReasonCode::CdNoCsv));
        };
        let Ok((header, rows)) = read_rows(source) else {
            return Ok(StepOutcome::failure(ReasonCode::CdNoCsv));
        };

        let id_column = column_index(&header, "patient_id").unwrap_or(0);
        let Some(row) = rows
            .iter()
            .find(|row| row.get(id_column).map(String::as_str) == Some(ctx.patient_id.as_str()))
        else {
            return Ok(StepOutcome::failure(ReasonCode::CdNoPatient));
        };

        let payload = encode_payload(&header, row)?;
        let study_uid = ctx
            .resolved
            .slices(FileRole::Ct)
            .and_then(|slices| slices.first())
            .and_then(|ds| ds.string(tags::STUDY_INSTANCE_UID))
            .unwrap_or_default();

        if cancel.is_set() {
            return Ok(StepOutcome::interrupt());
        }
        let report = sr::build_text_sr(
            &ctx.patient_id,
            &study_uid,
            sr::CLINICAL_DATA_SERIES,
            &payload,
        );
        let dir = ctx.step_output_dir(self.name().as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create step output directory {}", dir.display()))?;
        let path = dir.join("clinical_data_sr.dcm");
        report
            .write_to(&path)
            .with_context(|| format!("write clinical-data report {}", path.display()))?;
        Ok(StepOutcome::success())
    }
}

fn encode_payload(header: &[String], row: &[String]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    writer.write_record(row)?;
    let bytes = writer
        .into_inner()
        .map_err(|error| anyhow::anyhow!("flush clinical payload: {error}"))?;
    Ok(String::from_utf8(bytes)
        .context("clinical payload is not utf-8")?
        .trim_end()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_encoding_round_trips() {
        let header = vec!["patient_id".to_string(), "stage".to_string()];
        let row = vec!["P1".to_string(), "II,b".to_string()];
        let payload = encode_payload(&header, &row).unwrap();
        let (parsed_header, parsed_row) =
            crate::steps::common::parse_clinical_payload(&payload).unwrap();
        assert_eq!(parsed_header, header);
        assert_eq!(parsed_row, row);
    }
}
