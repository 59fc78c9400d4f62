//! Organizer use-case service.
//!
//! # Responsibility
//! - Reconcile the stored organizer against the live resource provider.
//! - Run folder mutations as `sync -> transform -> validate -> persist`.
//!
//! # Invariants
//! - The document is reloaded at the start of every operation.
//! - `replace` is never called when any earlier stage failed.
//! - Writes carry the revision observed at load time; a concurrent writer
//!   turns the write into `RevisionConflict`, never a silent overwrite.
//!
//! # See also
//! - `crate::service::reconcile` for the sync rules.
//! - `crate::integrity` for the post-mutation check.

use super::error::OrganizerServiceError;
use super::mutations;
use super::reconcile::{reconcile_organizer, ReconcileOptions};
use crate::integrity::{validate_organizer_integrity, OrganizerValidation};
use crate::model::organizer::{EntryId, OrganizerDocument, OrganizerResource, ViewId};
use crate::provider::{adapt_external_resource, ResourceProvider};
use crate::repo::organizer_repo::OrganizerRepository;
use log::{debug, error, info, warn};
use std::time::Instant;
use uuid::Uuid;

/// Service result alias.
pub type ServiceResult<T> = Result<T, OrganizerServiceError>;

/// Reconciled document and the revision it was loaded at.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedOrganizer {
    pub document: OrganizerDocument,
    /// Revision the stored document had (or has, after a persisting sync).
    pub revision: u64,
    /// Whether reconciliation changed the stored document.
    pub changed: bool,
}

/// Result of a persisted mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub document: OrganizerDocument,
    pub revision: u64,
    /// Entry ids created, changed, or removed by the mutation.
    pub affected_entry_ids: Vec<EntryId>,
}

/// Input for [`OrganizerService::create_folder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateFolderRequest {
    /// Defaults to the configured default view.
    pub view_id: Option<ViewId>,
    pub name: String,
    /// Defaults to the view root.
    pub parent_id: Option<EntryId>,
    /// Existing entry ids or resource ids, in display order.
    pub children_ids: Vec<String>,
}

/// Input for [`OrganizerService::set_folder_children`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetFolderChildrenRequest {
    pub view_id: Option<ViewId>,
    /// Defaults to the view root.
    pub folder_id: Option<EntryId>,
    pub children_ids: Vec<String>,
}

/// Input for [`OrganizerService::delete_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteEntriesRequest {
    pub view_id: Option<ViewId>,
    pub entry_ids: Vec<EntryId>,
}

/// Organizer service facade over injected persistence and inventory.
pub struct OrganizerService<R: OrganizerRepository, P: ResourceProvider> {
    repo: R,
    provider: P,
    options: ReconcileOptions,
}

impl<R: OrganizerRepository, P: ResourceProvider> OrganizerService<R, P> {
    /// Creates a service with default reconciliation options.
    pub fn new(repo: R, provider: P) -> Self {
        Self {
            repo,
            provider,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Loads the stored document and reconciles it with live resources.
    ///
    /// Nothing is persisted; `changed` tells whether a write would be needed.
    pub fn sync_and_get_organizer(&self) -> ServiceResult<SyncedOrganizer> {
        let started_at = Instant::now();
        let live = match self.provider.fetch_live() {
            Ok(live) => live,
            Err(err) => {
                error!(
                    "event=organizer_sync module=service status=error provider_id={} duration_ms={} error_code={} error={}",
                    self.provider.provider_id(),
                    started_at.elapsed().as_millis(),
                    err.code,
                    err
                );
                return Err(err.into());
            }
        };
        let live: Vec<OrganizerResource> = live.iter().map(adapt_external_resource).collect();

        let stored = self.repo.load()?;
        let outcome = reconcile_organizer(stored.document, live, &self.options);
        debug!(
            "event=organizer_sync module=service status=ok revision={} changed={} added={} removed={} attached={} duration_ms={}",
            stored.revision,
            outcome.changed,
            outcome.added_resources.len(),
            outcome.removed_resources.len(),
            outcome.attached_refs.len(),
            started_at.elapsed().as_millis()
        );

        Ok(SyncedOrganizer {
            document: outcome.document,
            revision: stored.revision,
            changed: outcome.changed,
        })
    }

    /// Syncs and persists the reconciled document when it changed.
    pub fn get_organizer(&self) -> ServiceResult<SyncedOrganizer> {
        let synced = self.sync_and_get_organizer()?;
        if !synced.changed {
            return Ok(synced);
        }

        let document = self.repo.validate(&synced.document)?;
        let revision = self.repo.replace(&document, synced.revision)?;
        info!(
            "event=organizer_sync module=service status=persisted revision={}",
            revision
        );
        Ok(SyncedOrganizer {
            document,
            revision,
            changed: true,
        })
    }

    /// Integrity report over the synced document.
    pub fn integrity_report(&self) -> ServiceResult<OrganizerValidation> {
        let synced = self.sync_and_get_organizer()?;
        Ok(validate_organizer_integrity(&synced.document))
    }

    /// Creates a folder under `parent_id` (root by default).
    ///
    /// Children that are bare resource ids get a new ref; existing entries
    /// are moved out of their previous folders.
    pub fn create_folder(&self, request: CreateFolderRequest) -> ServiceResult<MutationOutcome> {
        let name = normalize_folder_name(&request.name)?;
        let view_id = self.view_id(request.view_id);
        let folder_id = Uuid::new_v4().to_string();

        self.mutate("create_folder", |document| {
            mutations::create_folder(
                document,
                &view_id,
                folder_id,
                name,
                request.parent_id.as_deref(),
                &request.children_ids,
            )
        })
    }

    /// Replaces the children of `folder_id` (root by default).
    pub fn set_folder_children(
        &self,
        request: SetFolderChildrenRequest,
    ) -> ServiceResult<MutationOutcome> {
        let view_id = self.view_id(request.view_id);
        self.mutate("set_folder_children", |document| {
            mutations::set_folder_children(
                document,
                &view_id,
                request.folder_id.as_deref(),
                &request.children_ids,
            )
        })
    }

    /// Deletes entries and every folder descendant below them.
    pub fn delete_entries(&self, request: DeleteEntriesRequest) -> ServiceResult<MutationOutcome> {
        let view_id = self.view_id(request.view_id);
        self.mutate("delete_entries", |document| {
            mutations::delete_entries(document, &view_id, &request.entry_ids)
        })
    }

    pub fn rename_folder(
        &self,
        view_id: Option<ViewId>,
        folder_id: &str,
        name: &str,
    ) -> ServiceResult<MutationOutcome> {
        let name = normalize_folder_name(name)?;
        let view_id = self.view_id(view_id);
        self.mutate("rename_folder", |document| {
            mutations::rename_folder(document, &view_id, folder_id, name)
        })
    }

    /// Appends entries to `destination_folder_id`, detaching them elsewhere.
    pub fn move_entries_to_folder(
        &self,
        view_id: Option<ViewId>,
        entry_ids: &[EntryId],
        destination_folder_id: &str,
    ) -> ServiceResult<MutationOutcome> {
        let view_id = self.view_id(view_id);
        self.mutate("move_entries_to_folder", |document| {
            mutations::move_entries_to_folder(document, &view_id, entry_ids, destination_folder_id)
        })
    }

    fn view_id(&self, requested: Option<ViewId>) -> ViewId {
        requested
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.options.default_view_id.clone())
    }

    fn mutate<F>(&self, operation: &'static str, transform: F) -> ServiceResult<MutationOutcome>
    where
        F: FnOnce(&mut OrganizerDocument) -> ServiceResult<Vec<EntryId>>,
    {
        let started_at = Instant::now();
        match self.run_mutation(transform) {
            Ok(outcome) => {
                info!(
                    "event=organizer_mutation module=service status=ok operation={} revision={} affected={} duration_ms={}",
                    operation,
                    outcome.revision,
                    outcome.affected_entry_ids.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    "event=organizer_mutation module=service status=error operation={} retryable={} duration_ms={} error={}",
                    operation,
                    err.is_retryable(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_mutation<F>(&self, transform: F) -> ServiceResult<MutationOutcome>
    where
        F: FnOnce(&mut OrganizerDocument) -> ServiceResult<Vec<EntryId>>,
    {
        let synced = self.sync_and_get_organizer()?;
        let mut document = synced.document;
        let affected_entry_ids = transform(&mut document)?;

        let document = self.repo.validate(&document)?;
        let report = validate_organizer_integrity(&document);
        if !report.is_valid {
            let invalid_views: Vec<ViewId> = report
                .invalid_view_ids()
                .into_iter()
                .map(str::to_string)
                .collect();
            warn!(
                "event=organizer_validate module=service status=invalid views={}",
                invalid_views.join(",")
            );
            return Err(OrganizerServiceError::IntegrityViolation { invalid_views });
        }

        let revision = self.repo.replace(&document, synced.revision)?;
        Ok(MutationOutcome {
            document,
            revision,
            affected_entry_ids,
        })
    }
}

fn normalize_folder_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OrganizerServiceError::InvalidFolderName);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_folder_name;
    use crate::service::error::OrganizerServiceError;

    #[test]
    fn folder_name_is_trimmed() {
        assert_eq!(
            normalize_folder_name("  Media ").expect("name should be valid"),
            "Media"
        );
    }

    #[test]
    fn blank_folder_name_is_rejected() {
        assert!(matches!(
            normalize_folder_name(" \t"),
            Err(OrganizerServiceError::InvalidFolderName)
        ));
    }
}
