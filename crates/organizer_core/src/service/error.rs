//! Error surface of the organizer service.

use crate::model::organizer::{EntryId, ViewId};
use crate::provider::ProviderError;
use crate::repo::organizer_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for organizer use-cases.
#[derive(Debug)]
pub enum OrganizerServiceError {
    /// Folder name is blank after trimming.
    InvalidFolderName,
    /// Requested view does not exist in the document.
    ViewNotFound(ViewId),
    /// Parent of a new folder does not exist.
    ParentNotFound(EntryId),
    /// Parent of a new folder is a ref.
    ParentMustBeFolder(EntryId),
    /// Target folder does not exist.
    FolderNotFound(EntryId),
    /// Target entry exists but is a ref.
    NodeMustBeFolder(EntryId),
    /// Child id is neither an entry nor a known resource.
    ChildNotFound(String),
    /// Entry to move does not exist.
    EntryNotFound(EntryId),
    /// Entry id is already taken in the view.
    DuplicateEntry(EntryId),
    /// Placing `entry_id` under `folder_id` would create a cycle.
    CycleDetected { entry_id: EntryId, folder_id: EntryId },
    /// Mutated document failed the integrity check.
    IntegrityViolation { invalid_views: Vec<ViewId> },
    /// Document changed since it was loaded; retry the whole operation.
    RevisionConflict { expected: u64, actual: u64 },
    /// Document rejected by the repository schema check.
    Validation(String),
    /// Live resource listing failed.
    Provider(ProviderError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl OrganizerServiceError {
    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RevisionConflict { .. } => true,
            Self::Provider(err) => err.retryable,
            _ => false,
        }
    }
}

impl Display for OrganizerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFolderName => write!(f, "folder name must not be blank"),
            Self::ViewNotFound(view_id) => write!(f, "view not found: {view_id}"),
            Self::ParentNotFound(entry_id) => write!(f, "parent not found: {entry_id}"),
            Self::ParentMustBeFolder(entry_id) => {
                write!(f, "parent must be a folder: {entry_id}")
            }
            Self::FolderNotFound(entry_id) => write!(f, "folder not found: {entry_id}"),
            Self::NodeMustBeFolder(entry_id) => write!(f, "entry is not a folder: {entry_id}"),
            Self::ChildNotFound(id) => {
                write!(f, "child is neither an entry nor a resource: {id}")
            }
            Self::EntryNotFound(entry_id) => write!(f, "entry not found: {entry_id}"),
            Self::DuplicateEntry(entry_id) => write!(f, "entry already exists: {entry_id}"),
            Self::CycleDetected {
                entry_id,
                folder_id,
            } => write!(
                f,
                "placing `{entry_id}` under `{folder_id}` would create a cycle"
            ),
            Self::IntegrityViolation { invalid_views } => write!(
                f,
                "organizer integrity check failed for views: {}",
                invalid_views.join(",")
            ),
            Self::RevisionConflict { expected, actual } => write!(
                f,
                "organizer changed concurrently: expected revision {expected}, found {actual}"
            ),
            Self::Validation(message) => write!(f, "organizer validation failed: {message}"),
            Self::Provider(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrganizerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OrganizerServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RevisionConflict { expected, actual } => {
                Self::RevisionConflict { expected, actual }
            }
            RepoError::InvalidDocument(message) => Self::Validation(message),
            other => Self::Repo(other),
        }
    }
}

impl From<ProviderError> for OrganizerServiceError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}
