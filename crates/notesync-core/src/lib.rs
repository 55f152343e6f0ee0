//! Core library for notesync
//!
//! Syncs local Markdown files into macOS Notes. The crate provides:
//!
//! - **Configuration**: JSON config document with typed defaults and validation
//! - **Notes bridge**: note and folder operations behind the [`NotesBridge`] trait
//! - **Content transform**: Markdown to Notes display markup
//! - **Rules**: prioritized policies deciding whether and how a file is synced
//! - **SyncEngine**: runs the rules over files and reports batch statistics
//!
//! # Architecture
//!
//! ```text
//!          notesync-cli
//!               |
//!          SyncEngine ---- SyncConfig
//!           /       \
//!       RuleSet   NotesBridge (osascript | memory | dry run)
//!          |
//!   rule families -- ContentTransform
//! ```
//!
//! # Example
//!
//! ```
//! use std::fs;
//! use notesync_core::{MemoryBridge, SyncConfig, SyncEngine};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = dir.path().join("plan.md");
//! fs::write(&file, "# Plan\nShip it").unwrap();
//!
//! let engine = SyncEngine::new(SyncConfig::default(), Box::new(MemoryBridge::new()));
//! let stats = engine.sync_file(&file);
//! assert_eq!(stats.success_count, 1);
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod rules;
pub mod sync;
pub mod transform;

pub use bridge::{BridgeError, MemoryBridge, NoteIdentity, NotesBridge, OsascriptBridge};
pub use config::{ConfigStore, SyncConfig};
pub use error::{Error, Result};
pub use rules::{RuleOutcome, RuleSet, SyncRule};
pub use sync::{FileRecord, FileVerdict, NotesInfo, SyncEngine, SyncStats};
pub use transform::{ContentTransform, MarkdownConverter, markdown_to_notes};
