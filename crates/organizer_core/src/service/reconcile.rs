//! Reconciliation of the organizer inventory against live resources.
//!
//! # Invariants
//! - Pure: takes a document and a live list, returns the reconciled document.
//! - Running twice with the same live list changes nothing the second time.
//! - Every live resource ends up with a ref reachable from the default root.

use crate::model::organizer::{
    EntryId, OrganizerDocument, OrganizerEntry, OrganizerResource, OrganizerView, RefEntry,
    ResourceId, DEFAULT_ORGANIZER_ROOT_ID, DEFAULT_ORGANIZER_ROOT_NAME,
    DEFAULT_ORGANIZER_VIEW_ID, DEFAULT_ORGANIZER_VIEW_NAME,
};
use crate::tree::{collect_descendants, delete_organizer_entries_in_place, DeleteOptions};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What happens to inventory resources whose live counterpart disappeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResourcePolicy {
    /// Drop stale resources and every ref pointing at them.
    #[default]
    Prune,
    /// Keep stale resources untouched so existing refs stay valid.
    Retain,
}

/// Reconciliation knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub default_view_id: String,
    pub stale_policy: StaleResourcePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            default_view_id: DEFAULT_ORGANIZER_VIEW_ID.to_string(),
            stale_policy: StaleResourcePolicy::default(),
        }
    }
}

/// Reconciled document plus a summary of what moved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub document: OrganizerDocument,
    pub added_resources: Vec<ResourceId>,
    pub removed_resources: Vec<ResourceId>,
    /// Ref entries created or re-attached under the default root.
    pub attached_refs: Vec<EntryId>,
    pub changed: bool,
}

/// Brings `document` in line with `live`.
///
/// On duplicate live ids the first resource wins.
pub fn reconcile_organizer(
    document: OrganizerDocument,
    live: Vec<OrganizerResource>,
    options: &ReconcileOptions,
) -> ReconcileOutcome {
    let original = document.clone();
    let mut document = document;

    let mut live_by_id: BTreeMap<ResourceId, OrganizerResource> = BTreeMap::new();
    for resource in live {
        live_by_id.entry(resource.id.clone()).or_insert(resource);
    }

    let added_resources: Vec<ResourceId> = live_by_id
        .keys()
        .filter(|id| !document.resources.contains_key(*id))
        .cloned()
        .collect();

    let removed_resources = match options.stale_policy {
        StaleResourcePolicy::Prune => {
            let removed: Vec<ResourceId> = document
                .resources
                .keys()
                .filter(|id| !live_by_id.contains_key(*id))
                .cloned()
                .collect();
            document.resources = live_by_id.clone();
            removed
        }
        StaleResourcePolicy::Retain => {
            document.resources.extend(live_by_id.clone());
            Vec::new()
        }
    };

    if options.stale_policy == StaleResourcePolicy::Prune {
        prune_dangling_refs(&mut document);
    }

    let view = document
        .views
        .entry(options.default_view_id.clone())
        .or_insert_with(|| new_default_view(&options.default_view_id));
    let attached_refs = attach_missing_refs(view, live_by_id.keys());

    let changed = document != original;
    ReconcileOutcome {
        document,
        added_resources,
        removed_resources,
        attached_refs,
        changed,
    }
}

fn new_default_view(view_id: &str) -> OrganizerView {
    let name = if view_id == DEFAULT_ORGANIZER_VIEW_ID {
        DEFAULT_ORGANIZER_VIEW_NAME
    } else {
        view_id
    };
    OrganizerView::with_root_folder(
        view_id,
        name,
        DEFAULT_ORGANIZER_ROOT_ID,
        DEFAULT_ORGANIZER_ROOT_NAME,
    )
}

fn prune_dangling_refs(document: &mut OrganizerDocument) {
    let resources = &document.resources;
    for view in document.views.values_mut() {
        let dangling: Vec<EntryId> = view
            .entries
            .values()
            .filter_map(|entry| match entry {
                OrganizerEntry::Ref(reference) if !resources.contains_key(&reference.target) => {
                    Some(reference.id.clone())
                }
                _ => None,
            })
            .collect();
        if !dangling.is_empty() {
            delete_organizer_entries_in_place(view, &dangling, DeleteOptions::default());
        }
    }
}

/// Makes sure every id in `resource_ids` has a ref reachable from the root.
///
/// Reuses an unreachable ref targeting the resource when one exists, so a
/// detached entry keeps its id instead of gaining a duplicate.
fn attach_missing_refs<'r, I>(view: &mut OrganizerView, resource_ids: I) -> Vec<EntryId>
where
    I: IntoIterator<Item = &'r ResourceId>,
{
    if !view.entries.contains_key(&view.root) {
        let root = OrganizerView::with_root_folder(
            view.id.clone(),
            view.name.clone(),
            view.root.clone(),
            DEFAULT_ORGANIZER_ROOT_NAME,
        );
        view.entries.extend(root.entries);
    }
    if view.folder(&view.root).is_none() {
        warn!(
            "event=organizer_sync module=reconcile status=skipped view_id={} reason=root_not_folder",
            view.id
        );
        return Vec::new();
    }

    let reachable = collect_descendants(view, &view.root);
    let mut covered: BTreeSet<ResourceId> = reachable
        .iter()
        .filter_map(|id| match view.entries.get(id) {
            Some(OrganizerEntry::Ref(reference)) => Some(reference.target.clone()),
            _ => None,
        })
        .collect();

    let mut attached = Vec::new();
    for resource_id in resource_ids {
        if covered.contains(resource_id) {
            continue;
        }

        let detached = view.entries.values().find_map(|entry| match entry {
            OrganizerEntry::Ref(reference)
                if reference.target == *resource_id && !reachable.contains(&reference.id) =>
            {
                Some(reference.id.clone())
            }
            _ => None,
        });
        let entry_id = match detached {
            Some(entry_id) => entry_id,
            None => {
                let entry_id = unique_entry_id(view, resource_id);
                view.entries.insert(
                    entry_id.clone(),
                    OrganizerEntry::Ref(RefEntry::new(entry_id.clone(), resource_id.clone())),
                );
                entry_id
            }
        };

        let root_id = view.root.clone();
        if let Some(root) = view.folder_mut(&root_id) {
            root.children.push(entry_id.clone());
        }
        covered.insert(resource_id.clone());
        attached.push(entry_id);
    }
    attached
}

/// Entry id for a new ref: the resource id, suffixed when already taken.
pub(crate) fn unique_entry_id(view: &OrganizerView, resource_id: &str) -> EntryId {
    if !view.entries.contains_key(resource_id) {
        return resource_id.to_string();
    }
    (1..)
        .map(|n| format!("{resource_id}-ref-{n}"))
        .find(|candidate| !view.entries.contains_key(candidate))
        .unwrap_or_else(|| resource_id.to_string())
}
