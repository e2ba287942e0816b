//! File roles and SOP-Class-UID role tables.
//!
//! A role table is the only structured contract with the input directory
//! tree: it maps a DICOM SOP Class UID to the logical role a file plays for
//! a given step type, and declares whether that role is *sliceable* (many
//! ordered instances, one per image slice) or a *singleton* (at most one
//! active instance).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Well-known SOP Class UIDs used by the standard role tables.
pub mod sop_class {
    pub const CT_IMAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
    pub const MR_IMAGE: &str = "1.2.840.10008.5.1.4.1.1.4";
    pub const PET_IMAGE: &str = "1.2.840.10008.5.1.4.1.1.128";
    pub const RT_DOSE: &str = "1.2.840.10008.5.1.4.1.1.481.2";
    pub const RT_STRUCTURE_SET: &str = "1.2.840.10008.5.1.4.1.1.481.3";
    pub const RT_PLAN: &str = "1.2.840.10008.5.1.4.1.1.481.5";
    pub const BASIC_TEXT_SR: &str = "1.2.840.10008.5.1.4.1.1.88.11";
    pub const ENHANCED_SR: &str = "1.2.840.10008.5.1.4.1.1.88.22";
    pub const COMPREHENSIVE_SR: &str = "1.2.840.10008.5.1.4.1.1.88.33";
}

/// Logical role a file plays inside one patient's resolved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileRole {
    Ct,
    Pet,
    Mr,
    Rtss,
    Rtdose,
    Rtplan,
    Sr,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Ct => "ct",
            FileRole::Pet => "pet",
            FileRole::Mr => "mr",
            FileRole::Rtss => "rtss",
            FileRole::Rtdose => "rtdose",
            FileRole::Rtplan => "rtplan",
            FileRole::Sr => "sr",
        }
    }

    /// The one role whose resolution depends on the referenced image series.
    pub fn is_reference_sensitive(&self) -> bool {
        matches!(self, FileRole::Rtss)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileRole {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ct" => Ok(FileRole::Ct),
            "pet" => Ok(FileRole::Pet),
            "mr" => Ok(FileRole::Mr),
            "rtss" => Ok(FileRole::Rtss),
            "rtdose" => Ok(FileRole::Rtdose),
            "rtplan" => Ok(FileRole::Rtplan),
            "sr" => Ok(FileRole::Sr),
            other => Err(ModelError::UnknownFileRole(other.to_string())),
        }
    }
}

/// A role-table entry: the role plus its cardinality kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleEntry {
    pub role: FileRole,
    pub sliceable: bool,
}

/// SOP-Class-UID → role mapping, declared per step type.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    entries: BTreeMap<String, RoleEntry>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sop_class_uid: impl Into<String>, role: FileRole, sliceable: bool) {
        self.entries
            .insert(sop_class_uid.into(), RoleEntry { role, sliceable });
    }

    pub fn with(mut self, sop_class_uid: &str, role: FileRole, sliceable: bool) -> Self {
        self.insert(sop_class_uid, role, sliceable);
        self
    }

    /// Looks up the role for a SOP Class UID. Files whose class is absent
    /// from the table are ignored for the step this table serves.
    pub fn lookup(&self, sop_class_uid: &str) -> Option<RoleEntry> {
        self.entries.get(sop_class_uid).copied()
    }

    /// Folds another table into this one. Existing entries win, so merging
    /// the configured steps' tables is order-stable.
    pub fn merge(&mut self, other: &RoleTable) {
        for (uid, entry) in &other.entries {
            self.entries.entry(uid.clone()).or_insert(*entry);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The table shared by steps that work on a CT image stack with RT
    /// objects attached.
    pub fn ct_rt() -> Self {
        Self::new()
            .with(sop_class::CT_IMAGE, FileRole::Ct, true)
            .with(sop_class::RT_STRUCTURE_SET, FileRole::Rtss, false)
            .with(sop_class::RT_DOSE, FileRole::Rtdose, false)
            .with(sop_class::RT_PLAN, FileRole::Rtplan, false)
    }

    /// The table for PET-driven steps.
    pub fn pet() -> Self {
        Self::new().with(sop_class::PET_IMAGE, FileRole::Pet, true)
    }

    /// The table for steps reading or writing clinical-data structured
    /// reports alongside the image stack.
    pub fn ct_sr() -> Self {
        Self::new()
            .with(sop_class::CT_IMAGE, FileRole::Ct, true)
            .with(sop_class::BASIC_TEXT_SR, FileRole::Sr, false)
            .with(sop_class::ENHANCED_SR, FileRole::Sr, false)
            .with(sop_class::COMPREHENSIVE_SR, FileRole::Sr, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            FileRole::Ct,
            FileRole::Pet,
            FileRole::Mr,
            FileRole::Rtss,
            FileRole::Rtdose,
            FileRole::Rtplan,
            FileRole::Sr,
        ] {
            assert_eq!(role.as_str().parse::<FileRole>().unwrap(), role);
        }
        assert!("bogus".parse::<FileRole>().is_err());
    }

    #[test]
    fn lookup_misses_unknown_classes() {
        let table = RoleTable::ct_rt();
        assert_eq!(
            table.lookup(sop_class::CT_IMAGE).map(|e| e.role),
            Some(FileRole::Ct)
        );
        assert!(table.lookup("1.2.3.4").is_none());
    }

    #[test]
    fn merge_keeps_existing_entries() {
        let mut table = RoleTable::new().with(sop_class::CT_IMAGE, FileRole::Ct, true);
        let other = RoleTable::new().with(sop_class::CT_IMAGE, FileRole::Mr, false);
        table.merge(&other);
        let entry = table.lookup(sop_class::CT_IMAGE).unwrap();
        assert_eq!(entry.role, FileRole::Ct);
        assert!(entry.sliceable);
    }
}
