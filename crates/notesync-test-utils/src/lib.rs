//! Shared test utilities for the notesync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`]: [`NotesFixture`] builder for temporary source trees

pub mod fixture;

pub use fixture::NotesFixture;
