pub mod classify;
pub mod error;
pub mod natural;
pub mod resolve;
pub mod scan;

pub use classify::{ClassifiedFile, classify_paths};
pub use error::{IngestError, Result};
pub use natural::{natural_cmp, sort_paths_natural};
pub use resolve::{ResolvedFileSet, resolve, sort_image_stacks};
pub use scan::scan_directory;

use std::path::Path;

use onco_model::{PatientRecord, RoleTable};

/// Prepares one patient's resolved set: classify the patient's file bag
/// against the role table, resolve, then apply the anatomical stack sort.
pub fn resolve_patient(record: &PatientRecord, table: &RoleTable) -> Result<ResolvedFileSet> {
    let paths: Vec<&Path> = record.all_paths();
    let classified = classify_paths(&paths, table)?;
    let mut set = resolve(&record.patient_id, classified);
    sort_image_stacks(&mut set);
    Ok(set)
}
