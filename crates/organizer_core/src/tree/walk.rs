//! Shared cycle-safe graph walk over one view's entry map.
//!
//! # Invariants
//! - Every entry id is visited at most once per `visited` set.
//! - Ids absent from `entries` are skipped and never recorded.
//! - Visit order is depth-first pre-order: self, then children in array order.

use crate::model::organizer::{EntryId, OrganizerEntry};
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Walks entries reachable from `starts`, calling `visit` once per entry.
///
/// Ids already present in `visited` are treated as collected: they are not
/// visited again and their subtrees are not re-expanded from them. Newly
/// visited ids are appended to `visited` in traversal order.
///
/// The walk uses an explicit stack, so total work is bounded by the number
/// of entries regardless of cycles or tree depth.
pub fn walk_entries<'a, 's, I, F>(
    entries: &'a BTreeMap<EntryId, OrganizerEntry>,
    starts: I,
    visited: &mut IndexSet<EntryId>,
    mut visit: F,
) where
    I: IntoIterator<Item = &'s str>,
    F: FnMut(&'a OrganizerEntry),
{
    let mut stack: Vec<&str> = Vec::new();
    for start in starts {
        stack.push(start);
        while let Some(id) = stack.pop() {
            if visited.contains(id) {
                continue;
            }
            let Some((key, entry)) = entries.get_key_value(id) else {
                continue;
            };
            visited.insert(key.clone());
            visit(entry);
            match entry {
                OrganizerEntry::Folder(folder) => {
                    stack.extend(folder.children.iter().rev().map(String::as_str));
                }
                OrganizerEntry::Ref(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::walk_entries;
    use crate::model::organizer::{FolderEntry, OrganizerEntry, RefEntry};
    use indexmap::IndexSet;
    use std::collections::BTreeMap;

    fn folder(id: &str, children: &[&str]) -> (String, OrganizerEntry) {
        let mut entry = FolderEntry::new(id, id);
        entry.children = children.iter().map(|child| child.to_string()).collect();
        (id.to_string(), OrganizerEntry::Folder(entry))
    }

    fn reference(id: &str, target: &str) -> (String, OrganizerEntry) {
        (id.to_string(), OrganizerEntry::Ref(RefEntry::new(id, target)))
    }

    #[test]
    fn walk_is_preorder_and_skips_missing_children() {
        let entries: BTreeMap<_, _> = [
            folder("a", &["b", "ghost", "d"]),
            folder("b", &["c"]),
            reference("c", "x"),
            reference("d", "y"),
        ]
        .into_iter()
        .collect();

        let mut visited = IndexSet::new();
        let mut order = Vec::new();
        walk_entries(&entries, ["a"], &mut visited, |entry| {
            order.push(entry.id().to_string())
        });

        assert_eq!(order, vec!["a", "b", "c", "d"]);
        assert_eq!(visited.into_iter().collect::<Vec<_>>(), order);
    }

    #[test]
    fn walk_terminates_on_self_cycle() {
        let entries: BTreeMap<_, _> = [folder("loop", &["loop", "loop"])].into_iter().collect();

        let mut visited = IndexSet::new();
        let mut visits = 0;
        walk_entries(&entries, ["loop"], &mut visited, |_| visits += 1);

        assert_eq!(visits, 1);
    }

    #[test]
    fn pre_visited_ids_are_not_expanded() {
        let entries: BTreeMap<_, _> = [folder("a", &["b"]), folder("b", &["c"]), reference("c", "x")]
            .into_iter()
            .collect();

        let mut visited: IndexSet<String> = ["b".to_string()].into_iter().collect();
        let mut order = Vec::new();
        walk_entries(&entries, ["a"], &mut visited, |entry| {
            order.push(entry.id().to_string())
        });

        assert_eq!(order, vec!["a"]);
    }
}
