//! Step behavior over synthetic datasets: clinical-data round trip,
//! subgroup filtering, renaming, and the batch-level survival export.

use onco_core::config::{RunConfig, SubgroupFilter};
use onco_core::context::{BatchContext, PatientContext, ValueCache};
use onco_core::csvout::read_rows;
use onco_core::progress::NullProgress;
use onco_core::step::{BatchStep, ProcessStep};
use onco_core::steps::{ClinicalData2Csv, Fma2RoiName, KaplanMeier, RoiName2FmaId, SelectSubgroup};
use onco_dicom::{Dataset, rtss, sr};
use onco_ingest::classify::ClassifiedFile;
use onco_ingest::resolve::{ResolvedFileSet, resolve};
use onco_model::{CancellationToken, FileRole, ReasonCode, StepName};

fn resolved_with_sr(patient_id: &str, payload: &str) -> ResolvedFileSet {
    let report = sr::build_text_sr(patient_id, "1.2.3", sr::CLINICAL_DATA_SERIES, payload);
    resolve(
        patient_id,
        vec![ClassifiedFile::from_dataset(FileRole::Sr, false, report)],
    )
}

fn resolved_with_rtss(patient_id: &str, roi_names: &[&str]) -> ResolvedFileSet {
    let mut ds = rtss::new_rtss(patient_id, "1.9", "1.2.3", "1.2.3.4", "set");
    let rois: Vec<rtss::NewRoi> = roi_names
        .iter()
        .map(|name| rtss::NewRoi {
            name: (*name).to_string(),
            interpreted_type: "ORGAN".to_string(),
            contours: Vec::new(),
        })
        .collect();
    rtss::append_rois(&mut ds, "1.9", &rois);
    resolve(
        patient_id,
        vec![ClassifiedFile::from_dataset(FileRole::Rtss, false, ds)],
    )
}

#[test]
fn clinical_data_exports_and_accumulates() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let cancel = CancellationToken::new();
    let step = ClinicalData2Csv;

    for (id, row) in [("P1", "P1,61,1,200"), ("P2", "P2,54,0,340")] {
        let mut cache = ValueCache::new();
        let payload = format!("patient_id,age,event,duration\n{row}");
        let mut ctx = PatientContext::new(
            resolved_with_sr(id, &payload),
            &mut cache,
            dir.path(),
            &config,
        );
        let outcome = step.run(&mut ctx, &cancel, &NullProgress).unwrap();
        assert!(outcome.success, "{id}: {:?}", outcome.reason);
    }

    let csv_path = dir
        .path()
        .join(StepName::ClinicalData2Csv.as_str())
        .join("clinical_data.csv");
    let (header, rows) = read_rows(&csv_path).unwrap();
    assert_eq!(header[0], "patient_id");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "P2");
}

#[test]
fn missing_clinical_report_is_cd_no_sr() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let mut cache = ValueCache::new();
    // An SR that is not a clinical-data report.
    let report = sr::build_text_sr("P1", "1.2.3", "DOSE-REPORT", "x");
    let set = resolve(
        "P1",
        vec![ClassifiedFile::from_dataset(FileRole::Sr, false, report)],
    );
    let mut ctx = PatientContext::new(set, &mut cache, dir.path(), &config);
    let outcome = ClinicalData2Csv
        .run(&mut ctx, &CancellationToken::new(), &NullProgress)
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.reason, ReasonCode::CdNoSr);
}

#[test]
fn subgroup_filter_reads_the_clinical_attribute() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig {
        subgroup: Some(SubgroupFilter {
            attribute: "stage".to_string(),
            values: vec!["II".to_string(), "III".to_string()],
        }),
        ..RunConfig::default()
    };
    let cancel = CancellationToken::new();

    let mut cache = ValueCache::new();
    let mut ctx = PatientContext::new(
        resolved_with_sr("P1", "patient_id,stage\nP1,II"),
        &mut cache,
        dir.path(),
        &config,
    );
    let inside = SelectSubgroup.run(&mut ctx, &cancel, &NullProgress).unwrap();
    assert_eq!(inside.within_filter, Some(true));

    let mut cache = ValueCache::new();
    let mut ctx = PatientContext::new(
        resolved_with_sr("P2", "patient_id,stage\nP2,IV"),
        &mut cache,
        dir.path(),
        &config,
    );
    let outside = SelectSubgroup.run(&mut ctx, &cancel, &NullProgress).unwrap();
    assert_eq!(outside.within_filter, Some(false));
    assert!(outside.success);
}

#[test]
fn fma_rename_round_trips_and_updates_the_resolved_set() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let cancel = CancellationToken::new();
    let mut cache = ValueCache::new();

    let mut ctx = PatientContext::new(
        resolved_with_rtss("P1", &["Heart", "CustomRoi"]),
        &mut cache,
        dir.path(),
        &config,
    );
    let outcome = RoiName2FmaId.run(&mut ctx, &cancel, &NullProgress).unwrap();
    assert!(outcome.success);
    let names: Vec<String> = rtss::roi_entries(ctx.resolved.singleton(FileRole::Rtss).unwrap())
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["FMA7088", "CustomRoi"]);
    assert!(
        dir.path()
            .join("P1")
            .join(StepName::RoiName2FmaId.as_str())
            .join("rtss.dcm")
            .exists()
    );

    // And back again.
    let outcome = Fma2RoiName.run(&mut ctx, &cancel, &NullProgress).unwrap();
    assert!(outcome.success);
    let names: Vec<String> = rtss::roi_entries(ctx.resolved.singleton(FileRole::Rtss).unwrap())
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Heart", "CustomRoi"]);
}

#[test]
fn fma_rename_without_matches_reports_the_absence_code() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let mut cache = ValueCache::new();
    let mut ctx = PatientContext::new(
        resolved_with_rtss("P1", &["CustomRoi"]),
        &mut cache,
        dir.path(),
        &config,
    );
    let outcome = RoiName2FmaId
        .run(&mut ctx, &CancellationToken::new(), &NullProgress)
        .unwrap();
    assert_eq!(outcome.reason, ReasonCode::RoiNoFma);
}

#[test]
fn kaplan_meier_builds_a_survival_curve_from_the_batch_csv() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let cancel = CancellationToken::new();

    // Per-patient exports first.
    for (id, row) in [
        ("P1", "P1,10,1"),
        ("P2", "P2,20,0"),
        ("P3", "P3,30,1"),
    ] {
        let mut cache = ValueCache::new();
        let payload = format!("patient_id,duration,event\n{row}");
        let mut ctx = PatientContext::new(
            resolved_with_sr(id, &payload),
            &mut cache,
            dir.path(),
            &config,
        );
        ClinicalData2Csv
            .run(&mut ctx, &cancel, &NullProgress)
            .unwrap();
    }

    let batch_ctx = BatchContext {
        patients: &[],
        output_dir: dir.path(),
        config: &config,
    };
    let outcome = KaplanMeier.run(&batch_ctx, &cancel, &NullProgress).unwrap();
    assert!(outcome.success, "{:?}", outcome.reason);

    let (header, rows) = read_rows(&dir.path().join("kaplan-meier").join("survival.csv")).unwrap();
    assert_eq!(header, vec!["time", "at_risk", "events", "survival"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "10");
}

#[test]
fn kaplan_meier_without_data_reports_km_no_data() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RunConfig::default();
    let batch_ctx = BatchContext {
        patients: &[],
        output_dir: dir.path(),
        config: &config,
    };
    let outcome = KaplanMeier
        .run(&batch_ctx, &CancellationToken::new(), &NullProgress)
        .unwrap();
    assert_eq!(outcome.reason, ReasonCode::KmNoData);
}
