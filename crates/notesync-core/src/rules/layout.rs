//! Borrowing title, content and folder derivations from other rules

use std::path::Path;
use std::sync::Arc;

use super::defaults;
use super::rule::SyncRule;
use crate::config::SyncConfig;

/// Which rules name, fill and place a note.
///
/// Each slot holds a derivation rule; an empty slot, or a rule that is
/// disabled or does not apply to the file, falls through to the defaults.
#[derive(Clone, Default)]
pub struct NoteLayout {
    title: Option<Arc<dyn SyncRule>>,
    content: Option<Arc<dyn SyncRule>>,
    folder: Option<Arc<dyn SyncRule>>,
}

impl std::fmt::Debug for NoteLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = |slot: &Option<Arc<dyn SyncRule>>| slot.as_ref().map(|r| r.name().to_string());
        f.debug_struct("NoteLayout")
            .field("title", &name(&self.title))
            .field("content", &name(&self.content))
            .field("folder", &name(&self.folder))
            .finish()
    }
}

fn active<'a>(
    slot: &'a Option<Arc<dyn SyncRule>>,
    file: &Path,
    config: &SyncConfig,
) -> Option<&'a dyn SyncRule> {
    slot.as_deref()
        .filter(|rule| rule.is_enabled() && rule.should_apply(file, config))
}

impl NoteLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, rule: impl SyncRule + 'static) -> Self {
        self.title = Some(Arc::new(rule));
        self
    }

    pub fn with_content(mut self, rule: impl SyncRule + 'static) -> Self {
        self.content = Some(Arc::new(rule));
        self
    }

    pub fn with_folder(mut self, rule: impl SyncRule + 'static) -> Self {
        self.folder = Some(Arc::new(rule));
        self
    }

    pub fn title(&self, file: &Path, config: &SyncConfig) -> String {
        match active(&self.title, file, config) {
            Some(rule) => rule.title(file, config),
            None => defaults::title(file, config),
        }
    }

    pub fn content(&self, file: &Path, config: &SyncConfig) -> String {
        match active(&self.content, file, config) {
            Some(rule) => rule.content(file, config),
            None => defaults::content(file, config),
        }
    }

    pub fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        match active(&self.folder, file, config) {
            Some(rule) => rule.folder(file, config),
            None => defaults::folder(file, config),
        }
    }
}
