//! Structural shape checks for one view.

use crate::model::organizer::{OrganizerEntry, OrganizerView};
use std::collections::BTreeMap;

/// Result of structural validation. `errors` is keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureValidation {
    pub is_valid: bool,
    pub errors: BTreeMap<String, String>,
}

/// Checks view shape invariants.
///
/// - `id` and `root` must be non-blank.
/// - Every entry must be stored under its own id.
/// - The root entry, when present, must be a folder.
///
/// A missing root entry is not a structural defect.
pub fn validate_view_structure(view: &OrganizerView) -> StructureValidation {
    let mut errors = BTreeMap::new();

    if view.id.trim().is_empty() {
        errors.insert("id".to_string(), "view id must not be blank".to_string());
    }
    if view.root.trim().is_empty() {
        errors.insert("root".to_string(), "root id must not be blank".to_string());
    }

    for (key, entry) in &view.entries {
        if key != entry.id() {
            errors.insert(
                format!("entries.{key}"),
                format!("entry stored under `{key}` declares id `{}`", entry.id()),
            );
        }
    }

    match view.entries.get(&view.root) {
        Some(OrganizerEntry::Folder(_)) | None => {}
        Some(OrganizerEntry::Ref(_)) => {
            errors.insert(
                "root".to_string(),
                format!("root entry `{}` must be a folder", view.root),
            );
        }
    }

    StructureValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
