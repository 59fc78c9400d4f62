//! Organizer domain model.
//!
//! # Responsibility
//! - Define canonical data structures shared by tree, integrity, and service code.
//! - Keep one typed shape for both persisted JSON and in-memory transforms.
//!
//! # Invariants
//! - Entries are a closed sum type; every traversal matches exhaustively.

pub mod organizer;
