//! Notes bridge abstraction
//!
//! Rules and the engine talk to the Notes application only through
//! [`NotesBridge`]. Notes are addressed by `(title, folder)` where the folder
//! is a `/`-separated path of nested folders under the bridge's account. An
//! empty folder means the bridge's default folder.
//!
//! Implementations:
//!
//! - [`OsascriptBridge`] drives Notes.app through `osascript`
//! - [`MemoryBridge`] keeps notes in memory and records every call
//! - [`DryRunBridge`] forwards reads and records mutations without applying them

mod dry_run;
mod memory;
mod osascript;
pub mod script;

pub use dry_run::DryRunBridge;
pub use memory::MemoryBridge;
pub use osascript::OsascriptBridge;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors reported by a Notes bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The automation host could not be started
    #[error("Notes bridge unavailable: {message}")]
    Unavailable { message: String },

    /// The automation call exceeded its hard ceiling
    #[error("Notes script timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The script ran but reported a failure
    #[error("Notes script failed: {message}")]
    ScriptFailed { message: String },

    /// No note with this title in the folder
    #[error("Note not found: '{title}' in '{folder}'")]
    NoteNotFound { title: String, folder: String },

    /// A folder path had no usable segments
    #[error("Invalid folder path: '{path}'")]
    InvalidFolderPath { path: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Operations a bridge exposes, used for call logs and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeOp {
    NoteExists,
    CreateNote,
    UpdateNote,
    DeleteNote,
    GetFolders,
    GetExistingNotes,
    FolderExists,
    CreateFolder,
    GetNoteInfo,
}

impl BridgeOp {
    /// True for operations that change the Notes database
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateNote | Self::UpdateNote | Self::DeleteNote | Self::CreateFolder
        )
    }
}

/// Address of a note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NoteIdentity {
    pub title: String,
    pub folder: String,
}

impl NoteIdentity {
    pub fn new(title: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            folder: folder.into(),
        }
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.folder.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}/{}", self.folder, self.title)
        }
    }
}

/// Details of an existing note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteInfo {
    pub title: String,
    pub creation_date: String,
    pub modification_date: String,
    pub body: String,
}

/// Note and folder operations against one Notes account.
///
/// Every operation may fail; the Notes application can be busy, missing, or
/// not authorized. Callers are expected to turn errors into a reported
/// failure rather than abort.
pub trait NotesBridge: Send + Sync {
    /// Account the bridge writes into
    fn account(&self) -> &str;

    /// Check whether a note with this title exists in the folder
    fn note_exists(&self, title: &str, folder: &str) -> Result<bool>;

    /// Create a note; an existing note with the same title is not replaced
    fn create_note(&self, title: &str, content: &str, folder: &str) -> Result<()>;

    /// Replace the body of an existing note
    fn update_note(&self, title: &str, content: &str, folder: &str) -> Result<()>;

    /// Delete a note
    fn delete_note(&self, title: &str, folder: &str) -> Result<()>;

    /// Names of the top-level folders of the account
    fn get_folders(&self) -> Result<Vec<String>>;

    /// Titles of the notes in a folder; a missing folder has no notes
    fn get_existing_notes(&self, folder: &str) -> Result<Vec<String>>;

    /// Check whether a (possibly nested) folder exists
    fn folder_exists(&self, path: &str) -> Result<bool>;

    /// Create a nested folder path, creating each missing segment in turn.
    ///
    /// Segments that already exist are left alone.
    fn create_folder(&self, path: &str) -> Result<()>;

    /// Creation date, modification date and body of a note, if it exists
    fn get_note_info(&self, title: &str, folder: &str) -> Result<Option<NoteInfo>>;
}

/// Shared handles forward to the bridge they point at
impl<T: NotesBridge + ?Sized> NotesBridge for Arc<T> {
    fn account(&self) -> &str {
        (**self).account()
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        (**self).note_exists(title, folder)
    }

    fn create_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        (**self).create_note(title, content, folder)
    }

    fn update_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        (**self).update_note(title, content, folder)
    }

    fn delete_note(&self, title: &str, folder: &str) -> Result<()> {
        (**self).delete_note(title, folder)
    }

    fn get_folders(&self) -> Result<Vec<String>> {
        (**self).get_folders()
    }

    fn get_existing_notes(&self, folder: &str) -> Result<Vec<String>> {
        (**self).get_existing_notes(folder)
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        (**self).folder_exists(path)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        (**self).create_folder(path)
    }

    fn get_note_info(&self, title: &str, folder: &str) -> Result<Option<NoteInfo>> {
        (**self).get_note_info(title, folder)
    }
}

/// Split a folder path into its non-empty, trimmed segments
pub fn folder_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Normalize a folder path: trimmed segments joined by `/`
pub fn normalize_folder(path: &str) -> String {
    folder_segments(path).join("/")
}
