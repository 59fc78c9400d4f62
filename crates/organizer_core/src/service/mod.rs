//! Organizer use-case services.
//!
//! # Responsibility
//! - Reconcile the stored organizer with live resources.
//! - Expose folder mutations that validate before they persist.
//! - Keep CLI and other callers decoupled from storage details.

pub mod error;
mod mutations;
pub mod organizer_service;
pub mod reconcile;

pub use error::OrganizerServiceError;
pub use organizer_service::{
    CreateFolderRequest, DeleteEntriesRequest, MutationOutcome, OrganizerService, ServiceResult,
    SetFolderChildrenRequest, SyncedOrganizer,
};
pub use reconcile::{
    reconcile_organizer, ReconcileOptions, ReconcileOutcome, StaleResourcePolicy,
};
