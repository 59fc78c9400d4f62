//! Structural and referential integrity checks for organizer documents.
//!
//! # Responsibility
//! - Report dangling refs and shape defects as structured findings.
//! - Validate every view of a document independently.
//!
//! # Invariants
//! - Tolerated anomalies never become errors here; they become findings.
//! - Structure is checked before refs; refs are skipped when structure fails.
//! - A failing view never stops validation of the remaining views.

pub mod structure;

use crate::model::organizer::{
    EntryId, OrganizerDocument, OrganizerEntry, OrganizerResource, OrganizerView, ResourceId,
    ViewId,
};
use crate::tree::walk::walk_entries;
use indexmap::IndexSet;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use structure::{validate_view_structure, StructureValidation};

/// Findings for one view. Only the checks that actually ran are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewValidationErrors {
    pub structure_validation: Option<BTreeMap<String, String>>,
    pub all_refs_present: Option<bool>,
}

/// Integrity result for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewValidation {
    pub is_valid: bool,
    pub errors: ViewValidationErrors,
}

/// Integrity result for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizerValidation {
    pub is_valid: bool,
    /// One result per successfully processed view.
    pub errors: BTreeMap<ViewId, ViewValidation>,
    /// Views whose validation itself failed, with the failure message.
    pub failed_views: BTreeMap<ViewId, String>,
}

impl OrganizerValidation {
    /// View ids that were processed and found invalid, plus failed views.
    pub fn invalid_view_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .errors
            .iter()
            .filter(|(_, result)| !result.is_valid)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.extend(self.failed_views.keys().map(String::as_str));
        ids
    }
}

/// Failure raised by a view validator itself, as opposed to a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewValidatorError {
    pub message: String,
}

impl ViewValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ViewValidatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "view validation failed: {}", self.message)
    }
}

impl Error for ViewValidatorError {}

/// Collects every resource id referenced by any ref in `entries`.
///
/// Starts from every entry, not only the root, so refs unreachable from the
/// root are reported too. Order follows the shared pre-order walk.
pub fn get_refs_from_view_entries(
    entries: &BTreeMap<EntryId, OrganizerEntry>,
) -> IndexSet<ResourceId> {
    let mut visited = IndexSet::new();
    let mut refs = IndexSet::new();
    walk_entries(
        entries,
        entries.keys().map(String::as_str),
        &mut visited,
        |entry| match entry {
            OrganizerEntry::Ref(reference) => {
                refs.insert(reference.target.clone());
            }
            OrganizerEntry::Folder(_) => {}
        },
    );
    refs
}

/// True when every ref target in the view is a member of `resource_ids`.
pub fn validate_view_resource_refs(
    view: &OrganizerView,
    resource_ids: &BTreeSet<ResourceId>,
) -> bool {
    get_refs_from_view_entries(&view.entries)
        .iter()
        .all(|target| resource_ids.contains(target))
}

/// Fail-fast view validation: structure first, then ref presence.
pub fn validate_view_integrity(
    view: &OrganizerView,
    resources: &BTreeMap<ResourceId, OrganizerResource>,
) -> ViewValidation {
    let structure = validate_view_structure(view);
    if !structure.is_valid {
        return ViewValidation {
            is_valid: false,
            errors: ViewValidationErrors {
                structure_validation: Some(structure.errors),
                all_refs_present: None,
            },
        };
    }

    let resource_ids: BTreeSet<ResourceId> = resources.keys().cloned().collect();
    let all_refs_present = validate_view_resource_refs(view, &resource_ids);
    ViewValidation {
        is_valid: all_refs_present,
        errors: ViewValidationErrors {
            structure_validation: None,
            all_refs_present: Some(all_refs_present),
        },
    }
}

/// Validates every view of `organizer` with [`validate_view_integrity`].
pub fn validate_organizer_integrity(organizer: &OrganizerDocument) -> OrganizerValidation {
    validate_organizer_integrity_with(organizer, |view, resources| {
        Ok(validate_view_integrity(view, resources))
    })
}

/// Validates every view with a caller-supplied per-view validator.
///
/// A validator error is recorded in `failed_views` and counts as invalid,
/// but the loop continues with the next view.
pub fn validate_organizer_integrity_with<F>(
    organizer: &OrganizerDocument,
    validator: F,
) -> OrganizerValidation
where
    F: Fn(
        &OrganizerView,
        &BTreeMap<ResourceId, OrganizerResource>,
    ) -> Result<ViewValidation, ViewValidatorError>,
{
    let mut report = OrganizerValidation {
        is_valid: true,
        ..OrganizerValidation::default()
    };

    for (view_id, view) in &organizer.views {
        match validator(view, &organizer.resources) {
            Ok(result) => {
                if !result.is_valid {
                    report.is_valid = false;
                }
                report.errors.insert(view_id.clone(), result);
            }
            Err(err) => {
                warn!(
                    "event=organizer_validate module=integrity status=error view_id={} error={}",
                    view_id, err
                );
                report.is_valid = false;
                report.failed_views.insert(view_id.clone(), err.message);
            }
        }
    }

    debug!(
        "event=organizer_validate module=integrity status=ok views={} valid={}",
        organizer.views.len(),
        report.is_valid
    );
    report
}

#[cfg(test)]
mod tests {
    use super::{
        get_refs_from_view_entries, validate_organizer_integrity,
        validate_organizer_integrity_with, validate_view_integrity, validate_view_resource_refs,
        ViewValidation, ViewValidatorError,
    };
    use crate::model::organizer::{
        FolderEntry, OrganizerDocument, OrganizerEntry, OrganizerResource, OrganizerView,
        RefEntry,
    };
    use serde_json::Value;
    use std::collections::{BTreeMap, BTreeSet};

    fn resource(id: &str) -> OrganizerResource {
        OrganizerResource {
            id: id.to_string(),
            kind: "container".to_string(),
            name: id.to_string(),
            meta: Value::Null,
        }
    }

    fn view(id: &str, entries: Vec<OrganizerEntry>) -> OrganizerView {
        OrganizerView {
            id: id.to_string(),
            name: id.to_string(),
            root: "root".to_string(),
            entries: entries
                .into_iter()
                .map(|entry| (entry.id().to_string(), entry))
                .collect(),
        }
    }

    fn folder(id: &str, children: &[&str]) -> OrganizerEntry {
        let mut entry = FolderEntry::new(id, id);
        entry.children = children.iter().map(|child| child.to_string()).collect();
        OrganizerEntry::Folder(entry)
    }

    fn reference(id: &str, target: &str) -> OrganizerEntry {
        OrganizerEntry::Ref(RefEntry::new(id, target))
    }

    #[test]
    fn refs_include_entries_unreachable_from_root() {
        let view = view(
            "v",
            vec![
                folder("root", &["a"]),
                reference("a", "plex"),
                folder("island", &["island", "b"]),
                reference("b", "sonarr"),
            ],
        );

        let refs = get_refs_from_view_entries(&view.entries);
        let mut sorted: Vec<&str> = refs.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["plex", "sonarr"]);
    }

    #[test]
    fn empty_entries_are_trivially_valid() {
        let view = view("v", vec![]);
        assert!(validate_view_resource_refs(&view, &BTreeSet::new()));
        assert!(validate_view_integrity(&view, &BTreeMap::new()).is_valid);
    }

    #[test]
    fn dangling_ref_is_reported() {
        let view = view("v", vec![reference("a", "ghost")]);
        let result = validate_view_integrity(&view, &BTreeMap::new());

        assert!(!result.is_valid);
        assert_eq!(result.errors.all_refs_present, Some(false));
        assert!(result.errors.structure_validation.is_none());
    }

    #[test]
    fn structure_failure_skips_ref_check() {
        let view = view("v", vec![reference("root", "ghost")]);
        let result = validate_view_integrity(&view, &BTreeMap::new());

        assert!(!result.is_valid);
        assert!(result.errors.structure_validation.is_some());
        assert_eq!(result.errors.all_refs_present, None);
    }

    #[test]
    fn organizer_without_views_is_valid() {
        let report = validate_organizer_integrity(&OrganizerDocument::default());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn organizer_reports_each_view() {
        let mut doc = OrganizerDocument::default();
        doc.resources.insert("plex".to_string(), resource("plex"));
        doc.views.insert(
            "good".to_string(),
            view("good", vec![folder("root", &["a"]), reference("a", "plex")]),
        );
        doc.views.insert(
            "bad".to_string(),
            view("bad", vec![folder("root", &["a"]), reference("a", "ghost")]),
        );

        let report = validate_organizer_integrity(&doc);
        assert!(!report.is_valid);
        assert!(report.errors["good"].is_valid);
        assert!(!report.errors["bad"].is_valid);
        assert_eq!(report.invalid_view_ids(), vec!["bad"]);
    }

    #[test]
    fn validator_failure_does_not_stop_other_views() {
        let mut doc = OrganizerDocument::default();
        for id in ["first", "broken", "last"] {
            doc.views
                .insert(id.to_string(), view(id, vec![folder("root", &[])]));
        }

        let report = validate_organizer_integrity_with(&doc, |view, _| {
            if view.id == "broken" {
                return Err(ViewValidatorError::new("boom"));
            }
            Ok(ViewValidation {
                is_valid: true,
                ..ViewValidation::default()
            })
        });

        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.contains_key("first"));
        assert!(report.errors.contains_key("last"));
        assert_eq!(report.failed_views["broken"], "boom");
    }
}
