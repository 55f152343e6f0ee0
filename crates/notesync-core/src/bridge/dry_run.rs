//! Write-suppressing bridge proxy for dry runs

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::{NoteInfo, NotesBridge, Result, folder_segments, normalize_folder};

#[derive(Debug, Default)]
struct Plan {
    actions: Vec<String>,
    folders: BTreeSet<String>,
    notes: BTreeSet<(String, String)>,
}

/// Answers reads from the wrapped bridge and records mutations instead of
/// performing them.
///
/// Planned folders and notes are remembered, so a rule that creates a folder
/// and then checks for it sees a consistent picture. A failing read is
/// logged and answered as "absent" so that planning can continue without
/// Notes.app.
pub struct DryRunBridge<'a> {
    inner: &'a dyn NotesBridge,
    plan: Mutex<Plan>,
}

impl<'a> DryRunBridge<'a> {
    pub fn new(inner: &'a dyn NotesBridge) -> Self {
        Self {
            inner,
            plan: Mutex::new(Plan::default()),
        }
    }

    /// Drain the actions recorded since the last call
    pub fn take_actions(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().actions)
    }

    fn lock(&self) -> MutexGuard<'_, Plan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: String) {
        info!("{}", action);
        self.lock().actions.push(action);
    }

    fn display_folder(folder: &str) -> String {
        let folder = normalize_folder(folder);
        if folder.is_empty() {
            "default folder".to_string()
        } else {
            folder
        }
    }
}

impl NotesBridge for DryRunBridge<'_> {
    fn account(&self) -> &str {
        self.inner.account()
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        let key = (title.to_string(), normalize_folder(folder));
        if self.lock().notes.contains(&key) {
            return Ok(true);
        }
        match self.inner.note_exists(title, folder) {
            Ok(exists) => Ok(exists),
            Err(e) => {
                warn!(title, error = %e, "Dry run: note lookup failed, assuming absent");
                Ok(false)
            }
        }
    }

    fn create_note(&self, title: &str, _content: &str, folder: &str) -> Result<()> {
        self.lock()
            .notes
            .insert((title.to_string(), normalize_folder(folder)));
        self.record(format!(
            "[dry-run] Would create note '{}' in '{}'",
            title,
            Self::display_folder(folder)
        ));
        Ok(())
    }

    fn update_note(&self, title: &str, _content: &str, folder: &str) -> Result<()> {
        self.record(format!(
            "[dry-run] Would update note '{}' in '{}'",
            title,
            Self::display_folder(folder)
        ));
        Ok(())
    }

    fn delete_note(&self, title: &str, folder: &str) -> Result<()> {
        self.record(format!(
            "[dry-run] Would delete note '{}' in '{}'",
            title,
            Self::display_folder(folder)
        ));
        Ok(())
    }

    fn get_folders(&self) -> Result<Vec<String>> {
        Ok(self.inner.get_folders().unwrap_or_else(|e| {
            warn!(error = %e, "Dry run: folder listing failed");
            Vec::new()
        }))
    }

    fn get_existing_notes(&self, folder: &str) -> Result<Vec<String>> {
        Ok(self.inner.get_existing_notes(folder).unwrap_or_else(|e| {
            warn!(error = %e, "Dry run: note listing failed");
            Vec::new()
        }))
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        if self.lock().folders.contains(&normalize_folder(path)) {
            return Ok(true);
        }
        match self.inner.folder_exists(path) {
            Ok(exists) => Ok(exists),
            Err(e) => {
                warn!(folder = path, error = %e, "Dry run: folder lookup failed, assuming absent");
                Ok(false)
            }
        }
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let path = normalize_folder(path);
        self.record(format!("[dry-run] Would create folder '{}'", path));

        let segments = folder_segments(&path);
        let mut plan = self.lock();
        for depth in 1..=segments.len() {
            plan.folders.insert(segments[..depth].join("/"));
        }
        Ok(())
    }

    fn get_note_info(&self, title: &str, folder: &str) -> Result<Option<NoteInfo>> {
        Ok(self.inner.get_note_info(title, folder).unwrap_or_else(|e| {
            warn!(title, error = %e, "Dry run: note info lookup failed");
            None
        }))
    }
}
