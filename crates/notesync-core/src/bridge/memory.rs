//! In-memory Notes bridge
//!
//! Keeps notes and folders in memory, records every call and can be told to
//! fail specific operations. Used by tests and by callers that want to see
//! what a sync would produce without touching Notes.app.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{
    BridgeError, BridgeOp, NoteIdentity, NoteInfo, NotesBridge, Result, folder_segments,
    normalize_folder,
};

/// One recorded bridge call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeCall {
    pub op: BridgeOp,
    /// Note title, for note operations
    pub title: Option<String>,
    /// Normalized folder path the call resolved to
    pub folder: Option<String>,
}

/// A note held by [`MemoryBridge`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNote {
    pub title: String,
    pub folder: String,
    pub body: String,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
}

#[derive(Debug, Clone)]
struct Failure {
    op: BridgeOp,
    title: Option<String>,
}

impl Failure {
    fn matches(&self, op: BridgeOp, title: Option<&str>) -> bool {
        self.op == op
            && match &self.title {
                Some(expected) => title == Some(expected.as_str()),
                None => true,
            }
    }
}

#[derive(Debug, Default)]
struct State {
    folders: BTreeSet<String>,
    notes: Vec<MemoryNote>,
    calls: Vec<BridgeCall>,
    failures: Vec<Failure>,
    unavailable: bool,
}

/// In-memory [`NotesBridge`].
///
/// Creating a note in a folder that does not exist yet creates the folder.
/// Duplicate titles are allowed, as in Notes.app; lookups find the first.
#[derive(Debug)]
pub struct MemoryBridge {
    account: String,
    default_folder: String,
    state: Mutex<State>,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBridge {
    /// Bridge for the `iCloud` account with default folder `Notes`
    pub fn new() -> Self {
        Self::with_account("iCloud", "Notes")
    }

    pub fn with_account(account: impl Into<String>, default_folder: impl Into<String>) -> Self {
        let default_folder = normalize_folder(&default_folder.into());
        let bridge = Self {
            account: account.into(),
            default_folder,
            state: Mutex::new(State::default()),
        };
        let default_folder = bridge.default_folder.clone();
        bridge.lock().insert_folder(&default_folder);
        bridge
    }

    /// Seed a folder path, including its parents
    pub fn with_folder(self, path: &str) -> Self {
        self.lock().insert_folder(&normalize_folder(path));
        self
    }

    /// Seed a note; the folder is created if needed
    pub fn with_note(self, title: &str, folder: &str, body: &str) -> Self {
        let folder = self.resolve(folder);
        {
            let mut state = self.lock();
            state.insert_folder(&folder);
            let now = Local::now();
            state.notes.push(MemoryNote {
                title: title.to_string(),
                folder,
                body: body.to_string(),
                created: now,
                modified: now,
            });
        }
        self
    }

    /// Make every call of `op` fail
    pub fn fail_on(&self, op: BridgeOp) {
        self.lock().failures.push(Failure { op, title: None });
    }

    /// Make calls of `op` for one note title fail
    pub fn fail_on_title(&self, op: BridgeOp, title: &str) {
        self.lock().failures.push(Failure {
            op,
            title: Some(title.to_string()),
        });
    }

    /// Make every call fail as if Notes.app could not be reached
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.unavailable = false;
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of one operation
    pub fn call_count(&self, op: BridgeOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    /// Number of calls that would have changed Notes
    pub fn mutation_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.op.is_mutation()).count()
    }

    /// Snapshot of all notes
    pub fn notes(&self) -> Vec<MemoryNote> {
        self.lock().notes.clone()
    }

    /// Body of the first note with this identity
    pub fn note_body(&self, title: &str, folder: &str) -> Option<String> {
        let folder = self.resolve(folder);
        self.lock()
            .find(title, &folder)
            .map(|note| note.body.clone())
    }

    /// Number of notes sharing one identity
    pub fn count_notes(&self, identity: &NoteIdentity) -> usize {
        let folder = self.resolve(&identity.folder);
        self.lock()
            .notes
            .iter()
            .filter(|n| n.title == identity.title && n.folder == folder)
            .count()
    }

    /// All known folder paths, sorted
    pub fn folders(&self) -> Vec<String> {
        self.lock().folders.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, folder: &str) -> String {
        let folder = normalize_folder(folder);
        if folder.is_empty() {
            self.default_folder.clone()
        } else {
            folder
        }
    }

    /// Record a call and apply any injected failure
    fn enter(
        &self,
        op: BridgeOp,
        title: Option<&str>,
        folder: Option<&str>,
    ) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(BridgeCall {
            op,
            title: title.map(str::to_string),
            folder: folder.map(str::to_string),
        });
        if state.unavailable {
            return Err(BridgeError::Unavailable {
                message: "Notes is not running".to_string(),
            });
        }
        if state.failures.iter().any(|f| f.matches(op, title)) {
            return Err(BridgeError::ScriptFailed {
                message: format!("simulated {:?} failure", op),
            });
        }
        Ok(state)
    }
}

impl State {
    fn insert_folder(&mut self, path: &str) {
        let segments = folder_segments(path);
        for depth in 1..=segments.len() {
            self.folders.insert(segments[..depth].join("/"));
        }
    }

    fn find(&self, title: &str, folder: &str) -> Option<&MemoryNote> {
        self.notes
            .iter()
            .find(|n| n.title == title && n.folder == folder)
    }

    fn find_mut(&mut self, title: &str, folder: &str) -> Option<&mut MemoryNote> {
        self.notes
            .iter_mut()
            .find(|n| n.title == title && n.folder == folder)
    }
}

fn not_found(title: &str, folder: &str) -> BridgeError {
    BridgeError::NoteNotFound {
        title: title.to_string(),
        folder: folder.to_string(),
    }
}

impl NotesBridge for MemoryBridge {
    fn account(&self) -> &str {
        &self.account
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        let folder = self.resolve(folder);
        let state = self.enter(BridgeOp::NoteExists, Some(title), Some(&folder))?;
        Ok(state.find(title, &folder).is_some())
    }

    fn create_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        let folder = self.resolve(folder);
        let mut state = self.enter(BridgeOp::CreateNote, Some(title), Some(&folder))?;
        state.insert_folder(&folder);
        let now = Local::now();
        state.notes.push(MemoryNote {
            title: title.to_string(),
            folder,
            body: content.to_string(),
            created: now,
            modified: now,
        });
        Ok(())
    }

    fn update_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        let folder = self.resolve(folder);
        let mut state = self.enter(BridgeOp::UpdateNote, Some(title), Some(&folder))?;
        let note = state
            .find_mut(title, &folder)
            .ok_or_else(|| not_found(title, &folder))?;
        note.body = content.to_string();
        note.modified = Local::now();
        Ok(())
    }

    fn delete_note(&self, title: &str, folder: &str) -> Result<()> {
        let folder = self.resolve(folder);
        let mut state = self.enter(BridgeOp::DeleteNote, Some(title), Some(&folder))?;
        let index = state
            .notes
            .iter()
            .position(|n| n.title == title && n.folder == folder)
            .ok_or_else(|| not_found(title, &folder))?;
        state.notes.remove(index);
        Ok(())
    }

    fn get_folders(&self) -> Result<Vec<String>> {
        let state = self.enter(BridgeOp::GetFolders, None, None)?;
        Ok(state
            .folders
            .iter()
            .filter(|path| !path.contains('/'))
            .cloned()
            .collect())
    }

    fn get_existing_notes(&self, folder: &str) -> Result<Vec<String>> {
        let folder = self.resolve(folder);
        let state = self.enter(BridgeOp::GetExistingNotes, None, Some(&folder))?;
        Ok(state
            .notes
            .iter()
            .filter(|n| n.folder == folder)
            .map(|n| n.title.clone())
            .collect())
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        let path = normalize_folder(path);
        let state = self.enter(BridgeOp::FolderExists, None, Some(&path))?;
        if path.is_empty() {
            return Err(BridgeError::InvalidFolderPath { path });
        }
        Ok(state.folders.contains(&path))
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let normalized = normalize_folder(path);
        let mut state = self.enter(BridgeOp::CreateFolder, None, Some(&normalized))?;
        if normalized.is_empty() {
            return Err(BridgeError::InvalidFolderPath {
                path: path.to_string(),
            });
        }
        state.insert_folder(&normalized);
        Ok(())
    }

    fn get_note_info(&self, title: &str, folder: &str) -> Result<Option<NoteInfo>> {
        let folder = self.resolve(folder);
        let state = self.enter(BridgeOp::GetNoteInfo, Some(title), Some(&folder))?;
        Ok(state.find(title, &folder).map(|note| NoteInfo {
            title: note.title.clone(),
            creation_date: note.created.to_rfc3339(),
            modification_date: note.modified.to_rfc3339(),
            body: note.body.clone(),
        }))
    }
}
