//! Pure tree primitives over one organizer view.
//!
//! # Responsibility
//! - Collect descendants of an entry.
//! - Apply cascading deletion while keeping sibling order.
//!
//! # Invariants
//! - Never fails: dangling children, cycles, and a missing root are tolerated.
//! - Cycle guarding lives only in [`walk::walk_entries`].

mod delete;
pub mod walk;

pub use delete::{
    collect_descendants, collect_descendants_into, delete_organizer_entries,
    delete_organizer_entries_in_place, deletion_plan, DeleteOptions, DescendantCollector,
};
