//! Step implementations.

pub mod clinical;
pub mod common;
pub mod dvh2csv;
pub mod fma;
pub mod iso2roi;
pub mod kaplan_meier;
pub mod ml;
pub mod pyrad2csv;
pub mod roi_name_cleaning;
pub mod select_subgroup;
pub mod suv2roi;

pub use clinical::{ClinicalData2Csv, Csv2ClinicalDataSr};
pub use dvh2csv::Dvh2Csv;
pub use fma::{Fma2RoiName, RoiName2FmaId};
pub use iso2roi::Iso2Roi;
pub use kaplan_meier::KaplanMeier;
pub use ml::{MachineLearning, MachineLearningDataSelection};
pub use pyrad2csv::Pyrad2Csv;
pub use roi_name_cleaning::RoiNameCleaning;
pub use select_subgroup::SelectSubgroup;
pub use suv2roi::Suv2Roi;
