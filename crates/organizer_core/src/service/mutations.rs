//! In-memory structural transforms applied by the organizer service.
//!
//! Each transform checks its preconditions against the loaded document and
//! either mutates it fully or returns an error leaving nothing half-applied.

use super::error::OrganizerServiceError;
use super::reconcile::unique_entry_id;
use crate::model::organizer::{
    EntryId, FolderEntry, OrganizerDocument, OrganizerEntry, OrganizerView, RefEntry, ViewId,
};
use crate::tree::{
    collect_descendants, delete_organizer_entries_in_place, deletion_plan, DeleteOptions,
};
use indexmap::IndexSet;
use std::collections::BTreeMap;

type MutationResult<T> = Result<T, OrganizerServiceError>;

pub(crate) fn create_folder(
    document: &mut OrganizerDocument,
    view_id: &str,
    folder_id: EntryId,
    name: String,
    parent_id: Option<&str>,
    children_ids: &[EntryId],
) -> MutationResult<Vec<EntryId>> {
    let OrganizerDocument {
        resources, views, ..
    } = document;
    let view = view_mut(views, view_id)?;
    let parent_id = parent_id.unwrap_or(&view.root).to_string();

    match view.entries.get(&parent_id) {
        None => return Err(OrganizerServiceError::ParentNotFound(parent_id)),
        Some(OrganizerEntry::Ref(_)) => {
            return Err(OrganizerServiceError::ParentMustBeFolder(parent_id));
        }
        Some(OrganizerEntry::Folder(_)) => {}
    }
    if view.entries.contains_key(&folder_id) {
        return Err(OrganizerServiceError::DuplicateEntry(folder_id));
    }

    let children = dedupe(children_ids);
    ensure_children_resolvable(view, |id| resources.contains_key(id), &children)?;
    ensure_no_cycle(view, &parent_id, &children)?;

    let children = materialize_children(view, &children);
    detach(view, &children);

    let mut folder = FolderEntry::new(folder_id.clone(), name);
    folder.children = children;
    view.entries
        .insert(folder_id.clone(), OrganizerEntry::Folder(folder));
    if let Some(parent) = view.folder_mut(&parent_id) {
        parent.children.push(folder_id.clone());
    }
    Ok(vec![folder_id])
}

pub(crate) fn set_folder_children(
    document: &mut OrganizerDocument,
    view_id: &str,
    folder_id: Option<&str>,
    children_ids: &[EntryId],
) -> MutationResult<Vec<EntryId>> {
    let OrganizerDocument {
        resources, views, ..
    } = document;
    let view = view_mut(views, view_id)?;
    let folder_id = ensure_folder(view, folder_id)?;

    let children = dedupe(children_ids);
    ensure_children_resolvable(view, |id| resources.contains_key(id), &children)?;
    ensure_no_cycle(view, &folder_id, &children)?;

    let children = materialize_children(view, &children);
    detach(view, &children);
    if let Some(folder) = view.folder_mut(&folder_id) {
        folder.children = children;
    }
    Ok(vec![folder_id])
}

pub(crate) fn delete_entries(
    document: &mut OrganizerDocument,
    view_id: &str,
    entry_ids: &[EntryId],
) -> MutationResult<Vec<EntryId>> {
    let view = view_mut(&mut document.views, view_id)?;
    let removed: Vec<EntryId> = deletion_plan(view, entry_ids, DeleteOptions::default())
        .into_iter()
        .collect();
    delete_organizer_entries_in_place(view, entry_ids, DeleteOptions::default());
    Ok(removed)
}

pub(crate) fn rename_folder(
    document: &mut OrganizerDocument,
    view_id: &str,
    folder_id: &str,
    name: String,
) -> MutationResult<Vec<EntryId>> {
    let view = view_mut(&mut document.views, view_id)?;
    let folder_id = ensure_folder(view, Some(folder_id))?;
    if let Some(folder) = view.folder_mut(&folder_id) {
        folder.name = name;
    }
    Ok(vec![folder_id])
}

pub(crate) fn move_entries_to_folder(
    document: &mut OrganizerDocument,
    view_id: &str,
    entry_ids: &[EntryId],
    destination_folder_id: &str,
) -> MutationResult<Vec<EntryId>> {
    let view = view_mut(&mut document.views, view_id)?;
    let destination = ensure_folder(view, Some(destination_folder_id))?;

    let moving = dedupe(entry_ids);
    if let Some(missing) = moving.iter().find(|id| !view.entries.contains_key(*id)) {
        return Err(OrganizerServiceError::EntryNotFound(missing.clone()));
    }
    ensure_no_cycle(view, &destination, &moving)?;

    detach(view, &moving);
    if let Some(folder) = view.folder_mut(&destination) {
        folder.children.extend(moving.iter().cloned());
    }
    Ok(moving)
}

fn view_mut<'d>(
    views: &'d mut BTreeMap<ViewId, OrganizerView>,
    view_id: &str,
) -> MutationResult<&'d mut OrganizerView> {
    views
        .get_mut(view_id)
        .ok_or_else(|| OrganizerServiceError::ViewNotFound(view_id.to_string()))
}

/// Resolves an optional folder id (root by default) and checks its kind.
fn ensure_folder(view: &OrganizerView, folder_id: Option<&str>) -> MutationResult<EntryId> {
    let folder_id = folder_id.unwrap_or(&view.root).to_string();
    match view.entries.get(&folder_id) {
        None => Err(OrganizerServiceError::FolderNotFound(folder_id)),
        Some(OrganizerEntry::Ref(_)) => Err(OrganizerServiceError::NodeMustBeFolder(folder_id)),
        Some(OrganizerEntry::Folder(_)) => Ok(folder_id),
    }
}

fn dedupe(ids: &[EntryId]) -> Vec<EntryId> {
    ids.iter()
        .cloned()
        .collect::<IndexSet<EntryId>>()
        .into_iter()
        .collect()
}

fn ensure_children_resolvable<F>(
    view: &OrganizerView,
    is_resource: F,
    children: &[EntryId],
) -> MutationResult<()>
where
    F: Fn(&str) -> bool,
{
    match children
        .iter()
        .find(|id| !view.entries.contains_key(*id) && !is_resource(id))
    {
        Some(missing) => Err(OrganizerServiceError::ChildNotFound(missing.clone())),
        None => Ok(()),
    }
}

/// Rejects placing a folder inside itself or one of its own descendants.
fn ensure_no_cycle(
    view: &OrganizerView,
    folder_id: &str,
    children: &[EntryId],
) -> MutationResult<()> {
    for child in children {
        if !matches!(view.entries.get(child), Some(OrganizerEntry::Folder(_))) {
            continue;
        }
        if collect_descendants(view, child).contains(folder_id) {
            return Err(OrganizerServiceError::CycleDetected {
                entry_id: child.clone(),
                folder_id: folder_id.to_string(),
            });
        }
    }
    Ok(())
}

/// Maps child ids to entry ids, creating refs for bare resource ids.
fn materialize_children(view: &mut OrganizerView, children: &[EntryId]) -> Vec<EntryId> {
    let mut resolved = Vec::with_capacity(children.len());
    for child in children {
        if !view.entries.contains_key(child) {
            let entry_id = unique_entry_id(view, child);
            view.entries.insert(
                entry_id.clone(),
                OrganizerEntry::Ref(RefEntry::new(entry_id.clone(), child.clone())),
            );
            resolved.push(entry_id);
        } else {
            resolved.push(child.clone());
        }
    }
    resolved
}

/// Removes `ids` from every folder's children.
fn detach(view: &mut OrganizerView, ids: &[EntryId]) {
    for entry in view.entries.values_mut() {
        match entry {
            OrganizerEntry::Folder(folder) => folder.children.retain(|child| !ids.contains(child)),
            OrganizerEntry::Ref(_) => {}
        }
    }
}
