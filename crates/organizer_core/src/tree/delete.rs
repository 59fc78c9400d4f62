use super::walk::walk_entries;
use crate::model::organizer::{EntryId, OrganizerEntry, OrganizerView};
use indexmap::IndexSet;

/// Descendant collector hook used by cascading deletion.
///
/// Contract: ids already present in the collection must not be re-expanded.
pub type DescendantCollector<'c> = &'c dyn Fn(&OrganizerView, &str, &mut IndexSet<EntryId>);

/// Options for [`delete_organizer_entries`].
#[derive(Clone, Copy)]
pub struct DeleteOptions<'c> {
    collector: DescendantCollector<'c>,
}

impl Default for DeleteOptions<'_> {
    fn default() -> Self {
        Self {
            collector: &collect_descendants_into,
        }
    }
}

impl<'c> DeleteOptions<'c> {
    /// Overrides the descendant collector.
    pub fn with_collector(collector: DescendantCollector<'c>) -> Self {
        Self { collector }
    }
}

/// Returns `entry_id` and every entry reachable from it through folder children.
///
/// The set is in traversal order (self, then children depth-first in array
/// order). An id absent from the view yields an empty set.
pub fn collect_descendants(view: &OrganizerView, entry_id: &str) -> IndexSet<EntryId> {
    let mut collection = IndexSet::new();
    collect_descendants_into(view, entry_id, &mut collection);
    collection
}

/// Appends descendants of `entry_id` to a pre-seeded `collection`.
///
/// Returns immediately when `entry_id` is already collected, so callers can
/// re-invoke this per deletion target without expanding known subtrees twice.
pub fn collect_descendants_into(
    view: &OrganizerView,
    entry_id: &str,
    collection: &mut IndexSet<EntryId>,
) {
    if collection.contains(entry_id) {
        return;
    }
    walk_entries(&view.entries, [entry_id], collection, |_| {});
}

/// Computes every entry id a cascading delete of `ids` would remove.
pub fn deletion_plan<I, S>(
    view: &OrganizerView,
    ids: I,
    options: DeleteOptions<'_>,
) -> IndexSet<EntryId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut planned = IndexSet::new();
    for id in ids {
        (options.collector)(view, id.as_ref(), &mut planned);
    }
    planned
}

/// Copy-on-write cascading delete. The input view is left untouched.
pub fn delete_organizer_entries<I, S>(
    view: &OrganizerView,
    ids: I,
    options: DeleteOptions<'_>,
) -> OrganizerView
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut next = view.clone();
    delete_organizer_entries_in_place(&mut next, ids, options);
    next
}

/// In-place cascading delete. Returns the same view it was given.
///
/// Removes each requested id and, for folders, every transitive descendant.
/// Removed ids, and requested ids that were already absent, are then filtered
/// out of every remaining folder's children with relative order preserved.
pub fn delete_organizer_entries_in_place<'v, I, S>(
    view: &'v mut OrganizerView,
    ids: I,
    options: DeleteOptions<'_>,
) -> &'v mut OrganizerView
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let requested: Vec<EntryId> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
    if requested.is_empty() {
        return view;
    }

    let mut doomed = deletion_plan(view, &requested, options);
    for id in &doomed {
        view.entries.remove(id);
    }
    doomed.extend(requested);

    for entry in view.entries.values_mut() {
        match entry {
            OrganizerEntry::Folder(folder) => {
                folder.children.retain(|child| !doomed.contains(child));
            }
            OrganizerEntry::Ref(_) => {}
        }
    }
    view
}
