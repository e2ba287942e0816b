//! Dataset resolution: classified files → a role-addressable set.
//!
//! Resolution is a single pass over the classified files in acceptance
//! order. The rules, in the order they bind:
//!
//! - sliceable roles take sequential keys 0..N-1, locked to the series of
//!   that role's slice 0 (mixed-series protection);
//! - singleton non-reference-sensitive roles are first-accepted-wins;
//! - the reference-sensitive `rtss` role must match the primary image
//!   series, except that a candidate seen before any image series has
//!   resolved is accepted tentatively. That tentative acceptance is
//!   order-dependent and is preserved as-is pending product-owner
//!   confirmation; once any rtss is accepted it is never re-matched.

use std::collections::BTreeMap;

use tracing::debug;

use onco_dicom::Dataset;
use onco_model::FileRole;

use crate::classify::ClassifiedFile;

/// One patient's resolved files, keyed by role.
///
/// Exactly one of these is resident at a time; steps mutate it in place
/// (replacing the `rtss` entry after regenerating a structure set) and it is
/// discarded before the next patient's resolution begins.
#[derive(Debug, Default)]
pub struct ResolvedFileSet {
    patient_id: String,
    sliceable: BTreeMap<FileRole, Vec<Dataset>>,
    singletons: BTreeMap<FileRole, Dataset>,
    primary_series_uid: Option<String>,
}

impl ResolvedFileSet {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            ..Self::default()
        }
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// Series UID of slice 0 of the first sliceable role that accepted a
    /// file; the match target for reference-sensitive resolution.
    pub fn primary_series_uid(&self) -> Option<&str> {
        self.primary_series_uid.as_deref()
    }

    pub fn slices(&self, role: FileRole) -> Option<&[Dataset]> {
        self.sliceable.get(&role).map(Vec::as_slice)
    }

    pub fn singleton(&self, role: FileRole) -> Option<&Dataset> {
        self.singletons.get(&role)
    }

    pub fn singleton_mut(&mut self, role: FileRole) -> Option<&mut Dataset> {
        self.singletons.get_mut(&role)
    }

    /// Replaces a singleton entry; the cross-step channel steps use after
    /// regenerating a structure set.
    pub fn replace_singleton(&mut self, role: FileRole, dataset: Dataset) {
        self.singletons.insert(role, dataset);
    }

    pub fn has_role(&self, role: FileRole) -> bool {
        self.sliceable.get(&role).is_some_and(|v| !v.is_empty())
            || self.singletons.contains_key(&role)
    }

    /// Readiness for a step: every required role has at least one entry.
    pub fn is_ready(&self, required: &[FileRole]) -> bool {
        required.iter().all(|role| self.has_role(*role))
    }

    pub fn missing_roles(&self, required: &[FileRole]) -> Vec<FileRole> {
        required
            .iter()
            .copied()
            .filter(|role| !self.has_role(*role))
            .collect()
    }

    fn accept_slice(&mut self, role: FileRole, dataset: Dataset) {
        self.sliceable.entry(role).or_default().push(dataset);
    }
}

/// Resolves classified files (already in acceptance order) into a set.
pub fn resolve(patient_id: &str, classified: Vec<ClassifiedFile>) -> ResolvedFileSet {
    let mut set = ResolvedFileSet::new(patient_id);
    // Per-role series lock for sliceable roles.
    let mut role_series: BTreeMap<FileRole, String> = BTreeMap::new();
    let mut rtss_accepted = false;

    for file in classified {
        if file.sliceable {
            match (role_series.get(&file.role), &file.series_uid) {
                (Some(locked), Some(series)) if locked != series => {
                    debug!(
                        role = %file.role,
                        series = %series,
                        "excluding file from a different series"
                    );
                    continue;
                }
                (None, Some(series)) => {
                    role_series.insert(file.role, series.clone());
                    if set.primary_series_uid.is_none() {
                        set.primary_series_uid = Some(series.clone());
                    }
                }
                _ => {}
            }
            set.accept_slice(file.role, file.dataset);
            continue;
        }

        if file.role.is_reference_sensitive() {
            if rtss_accepted {
                continue;
            }
            match set.primary_series_uid.as_deref() {
                Some(primary) => {
                    if file.referenced_series_uid.as_deref() == Some(primary) {
                        set.singletons.insert(file.role, file.dataset);
                        rtss_accepted = true;
                    } else {
                        debug!(
                            referenced = ?file.referenced_series_uid,
                            primary = %primary,
                            "structure set does not reference the primary series"
                        );
                    }
                }
                // No image series resolved yet: tentative first-seen-wins
                // acceptance, preserved for structure-first datasets.
                None => {
                    set.singletons.insert(file.role, file.dataset);
                    rtss_accepted = true;
                }
            }
            continue;
        }

        // Singleton, non-reference-sensitive: first accepted wins.
        set.singletons.entry(file.role).or_insert(file.dataset);
    }

    set
}

/// Anatomical renumbering: reorders each sliceable role's keys by patient z
/// position. Applied after resolution; a renumbering pass, not a
/// replacement for acceptance-order numbering.
pub fn sort_image_stacks(set: &mut ResolvedFileSet) {
    for slices in set.sliceable.values_mut() {
        slices.sort_by(|a, b| {
            let az = a.slice_position();
            let bz = b.slice_position();
            az.partial_cmp(&bz).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
