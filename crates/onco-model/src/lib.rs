pub mod cancel;
pub mod error;
pub mod outcome;
pub mod patient;
pub mod roles;
pub mod steps;
pub mod summary;

pub use cancel::CancellationToken;
pub use error::{ModelError, Result};
pub use outcome::{ReasonCode, StepOutcome};
pub use patient::{ImageFile, PatientRecord, Series, SeriesGroup, Study};
pub use roles::{FileRole, RoleEntry, RoleTable, sop_class};
pub use steps::StepName;
pub use summary::BatchSummary;
