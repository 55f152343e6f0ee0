//! Sync engine and batch statistics
//!
//! This module provides:
//! - **engine**: run a rule set over one file, a list of files or a folder
//! - **stats**: per-file records and per-batch counts

mod engine;
mod stats;

pub use engine::{SyncEngine, discover_markdown};
pub use stats::{FileRecord, FileVerdict, FolderInfo, NotesInfo, RuleRecord, SyncStats};
