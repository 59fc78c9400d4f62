//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the organizer document persistence contract.
//! - Isolate SQLite and JSON encoding details from service orchestration.
//!
//! # Invariants
//! - Writes are whole-document replacements guarded by a revision token.

pub mod organizer_repo;

pub use organizer_repo::{
    OrganizerRepository, RepoError, RepoResult, SqliteOrganizerRepository, StoredOrganizer,
};
