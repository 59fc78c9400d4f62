//! Organizer document model.
//!
//! # Responsibility
//! - Define the persisted organizer shape: resources, views, and entries.
//! - Provide small lookup helpers shared by tree, integrity, and service code.
//!
//! # Invariants
//! - Map keys are expected to equal the embedded `id` of their value.
//! - `FolderEntry::children` order is display order.
//! - `RefEntry::target` is a weak pointer; it never owns the resource.
//! - Maps are ordered so serialization is deterministic.
//!
//! # See also
//! - `crate::tree` for traversal and deletion over views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry identifier, unique within one view.
pub type EntryId = String;
/// Resource identifier, unique across the whole organizer.
pub type ResourceId = String;
/// View identifier.
pub type ViewId = String;

/// Current persisted schema version.
pub const ORGANIZER_VERSION: u32 = 1;
/// View created by reconciliation when none exists.
pub const DEFAULT_ORGANIZER_VIEW_ID: &str = "default";
/// Root folder id of the default view.
pub const DEFAULT_ORGANIZER_ROOT_ID: &str = "root";
/// Display name of the default view.
pub const DEFAULT_ORGANIZER_VIEW_NAME: &str = "Default";
/// Display name of the default view's root folder.
pub const DEFAULT_ORGANIZER_ROOT_NAME: &str = "Root";

/// Root organizer document, persisted as one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerDocument {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, OrganizerResource>,
    #[serde(default)]
    pub views: BTreeMap<ViewId, OrganizerView>,
}

impl Default for OrganizerDocument {
    fn default() -> Self {
        Self {
            version: ORGANIZER_VERSION,
            resources: BTreeMap::new(),
            views: BTreeMap::new(),
        }
    }
}

impl OrganizerDocument {
    /// Returns one view by id.
    pub fn view(&self, view_id: &str) -> Option<&OrganizerView> {
        self.views.get(view_id)
    }

    /// Returns one view by id for mutation.
    pub fn view_mut(&mut self, view_id: &str) -> Option<&mut OrganizerView> {
        self.views.get_mut(view_id)
    }

    /// Whether `id` names a known resource.
    pub fn has_resource(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }
}

/// Adapted external object mirrored into the organizer inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerResource {
    pub id: ResourceId,
    /// Open-ended discriminator (`container`, `vm`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Full external object. Never interpreted by the organizer.
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// One independent tree over the shared resource inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerView {
    pub id: ViewId,
    pub name: String,
    /// Root entry id. A missing root entry behaves as an empty tree.
    pub root: EntryId,
    #[serde(default)]
    pub entries: BTreeMap<EntryId, OrganizerEntry>,
}

impl OrganizerView {
    /// Creates a view with one empty root folder.
    pub fn with_root_folder(
        id: impl Into<String>,
        name: impl Into<String>,
        root_id: impl Into<String>,
        root_name: impl Into<String>,
    ) -> Self {
        let root_id = root_id.into();
        let mut entries = BTreeMap::new();
        entries.insert(
            root_id.clone(),
            OrganizerEntry::Folder(FolderEntry::new(root_id.clone(), root_name)),
        );
        Self {
            id: id.into(),
            name: name.into(),
            root: root_id,
            entries,
        }
    }

    /// The default view with its empty root folder.
    pub fn default_view() -> Self {
        Self::with_root_folder(
            DEFAULT_ORGANIZER_VIEW_ID,
            DEFAULT_ORGANIZER_VIEW_NAME,
            DEFAULT_ORGANIZER_ROOT_ID,
            DEFAULT_ORGANIZER_ROOT_NAME,
        )
    }

    pub fn entry(&self, id: &str) -> Option<&OrganizerEntry> {
        self.entries.get(id)
    }

    /// Returns a folder entry by id, `None` when absent or not a folder.
    pub fn folder(&self, id: &str) -> Option<&FolderEntry> {
        match self.entries.get(id) {
            Some(OrganizerEntry::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    pub fn folder_mut(&mut self, id: &str) -> Option<&mut FolderEntry> {
        match self.entries.get_mut(id) {
            Some(OrganizerEntry::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    /// Finds the first ref entry targeting `resource_id`.
    pub fn ref_entry_for(&self, resource_id: &str) -> Option<&RefEntry> {
        self.entries.values().find_map(|entry| match entry {
            OrganizerEntry::Ref(reference) if reference.target == resource_id => Some(reference),
            _ => None,
        })
    }
}

/// Node in a view: either a folder or a reference to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrganizerEntry {
    Folder(FolderEntry),
    Ref(RefEntry),
}

impl OrganizerEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.id,
            Self::Ref(reference) => &reference.id,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Ordered container of child entry ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<EntryId>,
}

impl FolderEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// Weak pointer from a view entry to a resource id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub id: EntryId,
    pub target: ResourceId,
}

impl RefEntry {
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
        }
    }
}
