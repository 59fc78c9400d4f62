//! Core domain logic for the container organizer.
//! This crate is the single source of truth for organizer invariants.

pub mod db;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;
pub mod service;
pub mod settings;
pub mod tree;

pub use db::{open_db, open_db_in_memory, DbError};
pub use integrity::{
    get_refs_from_view_entries, validate_organizer_integrity, validate_organizer_integrity_with,
    validate_view_integrity, validate_view_resource_refs, validate_view_structure,
    OrganizerValidation, ViewValidation, ViewValidatorError,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::organizer::{
    EntryId, FolderEntry, OrganizerDocument, OrganizerEntry, OrganizerResource, OrganizerView,
    RefEntry, ResourceId, ViewId,
};
pub use provider::{
    resource_adapter, vm_resource_adapter, ExternalResource, ProviderError, ProviderRegistry,
    ResourceProvider, StaticResourceProvider,
};
pub use repo::organizer_repo::{
    OrganizerRepository, RepoError, RepoResult, SqliteOrganizerRepository, StoredOrganizer,
};
pub use service::{
    CreateFolderRequest, DeleteEntriesRequest, MutationOutcome, OrganizerService,
    OrganizerServiceError, SetFolderChildrenRequest, SyncedOrganizer,
};
pub use settings::{OrganizerSettings, SettingsError};
pub use tree::{collect_descendants, delete_organizer_entries, DeleteOptions};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
