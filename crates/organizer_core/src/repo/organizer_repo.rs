//! Organizer document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load, schema-check, and replace the organizer document as one unit.
//! - Keep SQL and JSON encoding details inside the repository boundary.
//!
//! # Invariants
//! - `replace` is an atomic single-row overwrite.
//! - `replace` only succeeds when the stored revision equals `expected_revision`.
//! - A missing row loads as the default document at revision 0.
//! - Stored bodies that fail to parse are reported, never masked.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::organizer::{OrganizerDocument, ORGANIZER_VERSION};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Document key used when none is configured.
pub const DEFAULT_DOCUMENT_KEY: &str = "docker";

/// Result type used by organizer repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from organizer repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document could not be encoded for storage.
    Encode(serde_json::Error),
    /// Document violates the persisted schema.
    InvalidDocument(String),
    /// Another writer replaced the document since it was loaded.
    RevisionConflict { expected: u64, actual: u64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted into a document.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode organizer document: {err}"),
            Self::InvalidDocument(message) => write!(f, "invalid organizer document: {message}"),
            Self::RevisionConflict { expected, actual } => write!(
                f,
                "organizer document changed concurrently: expected revision {expected}, found {actual}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "organizer repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted organizer data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidDocument(_) => None,
            Self::RevisionConflict { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Loaded document together with its optimistic-concurrency token.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrganizer {
    pub document: OrganizerDocument,
    /// 0 when nothing has been persisted yet.
    pub revision: u64,
}

/// Persistence boundary for the organizer document.
pub trait OrganizerRepository {
    /// Loads the latest persisted document, or the default document.
    fn load(&self) -> RepoResult<StoredOrganizer>;
    /// Checks the persisted schema and returns the document to store.
    fn validate(&self, document: &OrganizerDocument) -> RepoResult<OrganizerDocument>;
    /// Overwrites the stored document and returns the new revision.
    fn replace(&self, document: &OrganizerDocument, expected_revision: u64) -> RepoResult<u64>;
}

/// Schema checks shared by repository implementations.
///
/// Rejects unsupported versions, map keys that disagree with embedded ids,
/// blank resource ids or types, and views with a blank root id.
pub fn validate_document_schema(document: &OrganizerDocument) -> RepoResult<OrganizerDocument> {
    if document.version != ORGANIZER_VERSION {
        return Err(RepoError::InvalidDocument(format!(
            "unsupported version {}, expected {ORGANIZER_VERSION}",
            document.version
        )));
    }

    for (key, resource) in &document.resources {
        if key.trim().is_empty() {
            return Err(RepoError::InvalidDocument(
                "resource id must not be blank".to_string(),
            ));
        }
        if key != &resource.id {
            return Err(RepoError::InvalidDocument(format!(
                "resource stored under `{key}` declares id `{}`",
                resource.id
            )));
        }
        if resource.kind.trim().is_empty() {
            return Err(RepoError::InvalidDocument(format!(
                "resource `{key}` has a blank type"
            )));
        }
    }

    for (key, view) in &document.views {
        if key != &view.id {
            return Err(RepoError::InvalidDocument(format!(
                "view stored under `{key}` declares id `{}`",
                view.id
            )));
        }
        if view.root.trim().is_empty() {
            return Err(RepoError::InvalidDocument(format!(
                "view `{key}` has a blank root id"
            )));
        }
        for (entry_key, entry) in &view.entries {
            if entry_key != entry.id() {
                return Err(RepoError::InvalidDocument(format!(
                    "entry stored under `{entry_key}` in view `{key}` declares id `{}`",
                    entry.id()
                )));
            }
        }
    }

    Ok(document.clone())
}

/// SQLite-backed organizer repository, one row per document key.
pub struct SqliteOrganizerRepository<'conn> {
    conn: &'conn Connection,
    doc_key: String,
}

impl<'conn> SqliteOrganizerRepository<'conn> {
    /// Creates repository for the default document key.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_document_key(conn, DEFAULT_DOCUMENT_KEY)
    }

    /// Creates repository for one named document.
    pub fn try_with_document_key(
        conn: &'conn Connection,
        doc_key: impl Into<String>,
    ) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        let doc_key = doc_key.into().trim().to_string();
        if doc_key.is_empty() {
            return Err(RepoError::InvalidData(
                "document key must not be blank".to_string(),
            ));
        }
        Ok(Self { conn, doc_key })
    }

    pub fn document_key(&self) -> &str {
        &self.doc_key
    }
}

impl OrganizerRepository for SqliteOrganizerRepository<'_> {
    fn load(&self) -> RepoResult<StoredOrganizer> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT revision, body
                 FROM organizer_documents
                 WHERE doc_key = ?1;",
                [self.doc_key.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((revision, body)) = row else {
            debug!(
                "event=organizer_load module=repo status=ok doc_key={} revision=0 source=default",
                self.doc_key
            );
            return Ok(StoredOrganizer {
                document: OrganizerDocument::default(),
                revision: 0,
            });
        };

        let revision = parse_revision(revision)?;
        let document = serde_json::from_str::<OrganizerDocument>(&body).map_err(|err| {
            RepoError::InvalidData(format!(
                "organizer_documents.body for `{}` is not a valid document: {err}",
                self.doc_key
            ))
        })?;
        debug!(
            "event=organizer_load module=repo status=ok doc_key={} revision={}",
            self.doc_key, revision
        );
        Ok(StoredOrganizer { document, revision })
    }

    fn validate(&self, document: &OrganizerDocument) -> RepoResult<OrganizerDocument> {
        validate_document_schema(document)
    }

    fn replace(&self, document: &OrganizerDocument, expected_revision: u64) -> RepoResult<u64> {
        let body = serde_json::to_string(document).map_err(RepoError::Encode)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT revision
                 FROM organizer_documents
                 WHERE doc_key = ?1;",
                [self.doc_key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let actual = current.map(parse_revision).transpose()?.unwrap_or(0);

        if actual != expected_revision {
            warn!(
                "event=organizer_replace module=repo status=conflict doc_key={} expected_revision={} actual_revision={}",
                self.doc_key, expected_revision, actual
            );
            return Err(RepoError::RevisionConflict {
                expected: expected_revision,
                actual,
            });
        }

        let next = actual + 1;
        if actual == 0 {
            tx.execute(
                "INSERT INTO organizer_documents (doc_key, revision, body)
                 VALUES (?1, ?2, ?3);",
                params![self.doc_key, to_sql_revision(next)?, body],
            )?;
        } else {
            tx.execute(
                "UPDATE organizer_documents
                 SET revision = ?2,
                     body = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE doc_key = ?1;",
                params![self.doc_key, to_sql_revision(next)?, body],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=organizer_replace module=repo status=ok doc_key={} revision={}",
            self.doc_key, next
        );
        Ok(next)
    }
}

fn parse_revision(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid revision `{value}` in organizer_documents.revision"
        ))
    })
}

fn to_sql_revision(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("revision `{value}` exceeds storage range")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_document_schema, RepoError};
    use crate::model::organizer::{
        FolderEntry, OrganizerDocument, OrganizerEntry, OrganizerResource, OrganizerView,
    };
    use serde_json::Value;

    #[test]
    fn default_document_passes_schema() {
        let doc = OrganizerDocument::default();
        assert_eq!(validate_document_schema(&doc).expect("valid"), doc);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let doc = OrganizerDocument {
            version: 2,
            ..OrganizerDocument::default()
        };
        let err = validate_document_schema(&doc).expect_err("version 2 must be rejected");
        assert!(matches!(err, RepoError::InvalidDocument(message) if message.contains("version")));
    }

    #[test]
    fn resource_key_mismatch_is_rejected() {
        let mut doc = OrganizerDocument::default();
        doc.resources.insert(
            "plex".to_string(),
            OrganizerResource {
                id: "sonarr".to_string(),
                kind: "container".to_string(),
                name: "sonarr".to_string(),
                meta: Value::Null,
            },
        );
        assert!(validate_document_schema(&doc).is_err());
    }

    #[test]
    fn entry_key_mismatch_is_rejected() {
        let mut doc = OrganizerDocument::default();
        let mut view = OrganizerView::default_view();
        view.entries.insert(
            "a".to_string(),
            OrganizerEntry::Folder(FolderEntry::new("b", "B")),
        );
        doc.views.insert(view.id.clone(), view);
        assert!(validate_document_schema(&doc).is_err());
    }
}
