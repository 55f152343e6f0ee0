//! Basic sync rules: update, create, force-create, file type, dry run, backup

use std::path::Path;

use chrono::Local;
use tracing::{error, info};

use super::defaults;
use super::layout::NoteLayout;
use super::rule::{RuleKind, RuleMeta, RuleOutcome, SyncRule};
use crate::Result;
use crate::bridge::NotesBridge;
use crate::config::SyncConfig;

/// How a rule writes its note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Update a note with the same identity, otherwise create one
    Upsert,
    /// Create only when no note has the same identity
    CreateIfMissing,
    /// Always create, even next to an identical title
    AlwaysCreate,
}

/// Write a note through the bridge, turning bridge errors into a failure
pub(crate) fn write_note(
    rule: &str,
    bridge: &dyn NotesBridge,
    title: &str,
    content: &str,
    folder: &str,
    mode: WriteMode,
) -> RuleOutcome {
    let exists = match mode {
        WriteMode::AlwaysCreate => false,
        WriteMode::Upsert | WriteMode::CreateIfMissing => {
            match bridge.note_exists(title, folder) {
                Ok(exists) => exists,
                Err(e) => {
                    error!(rule, title, folder, error = %e, "Note lookup failed");
                    return RuleOutcome::failed(e.to_string());
                }
            }
        }
    };

    let result = match (mode, exists) {
        (WriteMode::CreateIfMissing, true) => {
            info!(rule, title, folder, "Note already exists, skipping");
            return RuleOutcome::no_op("note already exists");
        }
        (WriteMode::Upsert, true) => bridge.update_note(title, content, folder).map(|_| {
            RuleOutcome::Updated {
                title: title.to_string(),
                folder: folder.to_string(),
            }
        }),
        _ => bridge.create_note(title, content, folder).map(|_| RuleOutcome::Created {
            title: title.to_string(),
            folder: folder.to_string(),
        }),
    };

    result.unwrap_or_else(|e| {
        error!(rule, title, folder, error = %e, "Failed to write note");
        RuleOutcome::failed(e.to_string())
    })
}

/// Shared pre-checks: excluded files are a no-op, oversized files fail
fn precheck(file: &Path, config: &SyncConfig) -> Option<RuleOutcome> {
    if defaults::should_ignore(file, config) {
        return Some(RuleOutcome::no_op("excluded by pattern"));
    }
    if !defaults::check_size(file, config) {
        return Some(RuleOutcome::failed(format!(
            "file exceeds {} MB",
            config.sync_rules.max_file_size_mb
        )));
    }
    None
}

macro_rules! meta_accessors {
    () => {
        fn meta(&self) -> &RuleMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RuleMeta {
            &mut self.meta
        }
    };
}
pub(crate) use meta_accessors;

macro_rules! layout_derivations {
    () => {
        fn title(&self, file: &Path, config: &SyncConfig) -> String {
            self.layout.title(file, config)
        }

        fn content(&self, file: &Path, config: &SyncConfig) -> String {
            self.layout.content(file, config)
        }

        fn folder(&self, file: &Path, config: &SyncConfig) -> String {
            self.layout.folder(file, config)
        }
    };
}

/// Update the note if it exists, otherwise create it.
///
/// Applies only while `sync_rules.auto_update` is on.
#[derive(Debug, Clone)]
pub struct UpdateExisting {
    meta: RuleMeta,
    layout: NoteLayout,
}

impl UpdateExisting {
    pub const NAME: &'static str = "update-existing";

    pub fn new() -> Self {
        Self::with_priority(100)
    }

    pub fn with_priority(priority: i32) -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, priority),
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for UpdateExisting {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for UpdateExisting {
    meta_accessors!();
    layout_derivations!();

    fn should_apply(&self, _file: &Path, config: &SyncConfig) -> bool {
        self.meta.enabled && config.sync_rules.auto_update
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        if let Some(outcome) = precheck(file, config) {
            return Ok(outcome);
        }
        let title = self.title(file, config);
        let folder = self.folder(file, config);
        let content = self.content(file, config);
        Ok(write_note(
            self.name(),
            bridge,
            &title,
            &content,
            &folder,
            WriteMode::Upsert,
        ))
    }
}

/// Create the note unless one with the same identity exists
#[derive(Debug, Clone)]
pub struct CreateNew {
    meta: RuleMeta,
    layout: NoteLayout,
}

impl CreateNew {
    pub const NAME: &'static str = "create-new";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 80),
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for CreateNew {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for CreateNew {
    meta_accessors!();
    layout_derivations!();

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        if let Some(outcome) = precheck(file, config) {
            return Ok(outcome);
        }
        let title = self.title(file, config);
        let folder = self.folder(file, config);
        let content = self.content(file, config);
        Ok(write_note(
            self.name(),
            bridge,
            &title,
            &content,
            &folder,
            WriteMode::CreateIfMissing,
        ))
    }
}

/// Always create a new note, duplicating titles if needed
#[derive(Debug, Clone)]
pub struct ForceCreate {
    meta: RuleMeta,
    layout: NoteLayout,
}

impl ForceCreate {
    pub const NAME: &'static str = "force-create";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 60),
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for ForceCreate {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for ForceCreate {
    meta_accessors!();
    layout_derivations!();

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        if let Some(outcome) = precheck(file, config) {
            return Ok(outcome);
        }
        let title = self.title(file, config);
        let folder = self.folder(file, config);
        let content = self.content(file, config);
        Ok(write_note(
            self.name(),
            bridge,
            &title,
            &content,
            &folder,
            WriteMode::AlwaysCreate,
        ))
    }
}

/// Extension allow-list filter
#[derive(Debug, Clone)]
pub struct FileType {
    meta: RuleMeta,
    extensions: Vec<String>,
}

impl FileType {
    pub const NAME: &'static str = "file-type";

    /// Default allow-list: `.md`, `.markdown`, `.txt`
    pub fn new() -> Self {
        Self::with_extensions([".md", ".markdown", ".txt"])
    }

    /// Extensions are compared case-insensitively, with or without the dot
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            meta: RuleMeta::new(Self::NAME, 95),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.meta.priority = priority;
        self
    }
}

impl Default for FileType {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for FileType {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Filter
    }

    /// A disabled filter lets every file through
    fn should_apply(&self, file: &Path, _config: &SyncConfig) -> bool {
        if !self.meta.enabled {
            return true;
        }
        file.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        Ok(RuleOutcome::no_op("file type accepted"))
    }
}

/// Reports what a sync would do when `dry_run` is set
#[derive(Debug, Clone)]
pub struct DryRun {
    meta: RuleMeta,
    layout: NoteLayout,
}

impl DryRun {
    pub const NAME: &'static str = "dry-run";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 200),
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for DryRun {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for DryRun {
    meta_accessors!();
    layout_derivations!();

    fn should_apply(&self, _file: &Path, config: &SyncConfig) -> bool {
        self.meta.enabled && config.dry_run
    }

    /// Only reads from the bridge
    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if defaults::should_ignore(file, config) {
            return Ok(RuleOutcome::Planned {
                actions: vec![format!("[dry-run] Would skip '{}'", name)],
            });
        }

        let title = self.title(file, config);
        let folder = self.folder(file, config);
        let action = match bridge.note_exists(&title, &folder) {
            Ok(true) => format!(
                "[dry-run] Would sync '{}' by updating note '{}' in '{}'",
                name, title, folder
            ),
            Ok(false) => format!(
                "[dry-run] Would sync '{}' by creating note '{}' in '{}'",
                name, title, folder
            ),
            Err(e) => format!(
                "[dry-run] Would sync '{}' to note '{}' in '{}' (lookup failed: {})",
                name, title, folder, e
            ),
        };
        Ok(RuleOutcome::Planned {
            actions: vec![action],
        })
    }
}

/// Copy an existing note to `<title>_backup_<timestamp>` before it is
/// overwritten.
///
/// Applies only while `sync_rules.backup_before_update` is on, and never to
/// files the write rules would refuse (excluded or oversize).
#[derive(Debug, Clone)]
pub struct Backup {
    meta: RuleMeta,
    layout: NoteLayout,
}

impl Backup {
    pub const NAME: &'static str = "backup";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 110),
            layout: NoteLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for Backup {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for Backup {
    meta_accessors!();
    layout_derivations!();

    fn should_apply(&self, file: &Path, config: &SyncConfig) -> bool {
        self.meta.enabled
            && config.sync_rules.backup_before_update
            && precheck(file, config).is_none()
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        let title = self.title(file, config);
        let folder = self.folder(file, config);

        let info = match bridge.get_note_info(&title, &folder) {
            Ok(Some(info)) => info,
            Ok(None) => return Ok(RuleOutcome::no_op("no existing note to back up")),
            Err(e) => {
                error!(rule = self.name(), title, error = %e, "Failed to read note for backup");
                return Ok(RuleOutcome::failed(e.to_string()));
            }
        };

        let backup_title = format!("{}_backup_{}", title, Local::now().format("%Y%m%d_%H%M%S"));
        Ok(write_note(
            self.name(),
            bridge,
            &backup_title,
            &info.body,
            &folder,
            WriteMode::AlwaysCreate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeOp, MemoryBridge, NoteIdentity};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.notes_config.add_source_path = false;
        config.sync_rules.folder_mappings = Default::default();
        config
    }

    fn write(temp: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn update_existing_updates_when_note_exists() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "new body");
        let mut config = config();
        config.notes_config.default_folder = "X".into();

        let bridge = MemoryBridge::new().with_note("Foo", "X", "old body");
        let outcome = UpdateExisting::new().execute(&file, &bridge, &config).unwrap();

        assert_eq!(
            outcome,
            RuleOutcome::Updated {
                title: "Foo".into(),
                folder: "X".into()
            }
        );
        assert_eq!(bridge.call_count(BridgeOp::UpdateNote), 1);
        assert_eq!(bridge.call_count(BridgeOp::CreateNote), 0);
        assert_eq!(bridge.note_body("Foo", "X").as_deref(), Some("new body"));
    }

    #[test]
    fn update_existing_creates_when_missing() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let mut config = config();
        config.notes_config.default_folder = "X".into();

        let bridge = MemoryBridge::new();
        let outcome = UpdateExisting::new().execute(&file, &bridge, &config).unwrap();

        assert!(matches!(outcome, RuleOutcome::Created { .. }));
        assert_eq!(bridge.call_count(BridgeOp::UpdateNote), 0);
        assert_eq!(bridge.call_count(BridgeOp::CreateNote), 1);
    }

    #[test]
    fn update_existing_reports_bridge_failure() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new();
        bridge.fail_on(BridgeOp::CreateNote);

        let outcome = UpdateExisting::new().execute(&file, &bridge, &config()).unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn update_existing_follows_auto_update() {
        let mut config = config();
        assert!(UpdateExisting::new().should_apply(Path::new("a.md"), &config));
        config.sync_rules.auto_update = false;
        assert!(!UpdateExisting::new().should_apply(Path::new("a.md"), &config));
    }

    #[test]
    fn ignored_file_is_a_successful_no_op() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "x.tmp.md", "body");
        let bridge = MemoryBridge::new();

        let outcome = UpdateExisting::new().execute(&file, &bridge, &config()).unwrap();
        assert!(matches!(outcome, RuleOutcome::NoOp { .. }));
        assert!(bridge.calls().is_empty());
    }

    #[test]
    fn oversized_file_fails() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "big.md", &"a".repeat(2048));
        let mut config = config();
        config.sync_rules.max_file_size_mb = 0.001;

        let outcome = UpdateExisting::new()
            .execute(&file, &MemoryBridge::new(), &config)
            .unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn create_new_leaves_existing_note_alone() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new().with_note("Foo", "Notes", "old");

        let outcome = CreateNew::new().execute(&file, &bridge, &config()).unwrap();
        assert_eq!(outcome, RuleOutcome::no_op("note already exists"));
        assert_eq!(bridge.mutation_count(), 0);
    }

    #[test]
    fn force_create_duplicates() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new().with_note("Foo", "Notes", "old");

        let outcome = ForceCreate::new().execute(&file, &bridge, &config()).unwrap();
        assert!(matches!(outcome, RuleOutcome::Created { .. }));
        assert_eq!(bridge.count_notes(&NoteIdentity::new("Foo", "Notes")), 2);
        assert_eq!(bridge.call_count(BridgeOp::NoteExists), 0);
    }

    #[test]
    fn file_type_filters_extensions() {
        let rule = FileType::new();
        let config = config();
        assert!(rule.should_apply(Path::new("a.md"), &config));
        assert!(rule.should_apply(Path::new("a.MARKDOWN"), &config));
        assert!(rule.should_apply(Path::new("a.txt"), &config));
        assert!(!rule.should_apply(Path::new("a.rs"), &config));
        assert!(!rule.should_apply(Path::new("Makefile"), &config));
        assert_eq!(rule.kind(), RuleKind::Filter);
    }

    #[test]
    fn dry_run_applies_only_when_flagged() {
        let rule = DryRun::new();
        let config = config();
        assert!(!rule.should_apply(Path::new("a.md"), &config));
        assert!(rule.should_apply(Path::new("a.md"), &config.with_dry_run(true)));
    }

    #[test]
    fn dry_run_reports_without_mutating() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new().with_note("Foo", "Notes", "old");

        let outcome = DryRun::new()
            .execute(&file, &bridge, &config().with_dry_run(true))
            .unwrap();
        let RuleOutcome::Planned { actions } = outcome else {
            panic!("expected a plan");
        };
        assert_eq!(actions.len(), 1);
        assert!(actions[0].contains("updating note 'Foo'"));
        assert_eq!(bridge.mutation_count(), 0);
    }

    #[test]
    fn backup_copies_existing_body() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new().with_note("Foo", "Notes", "old body");
        let mut config = config();
        config.sync_rules.backup_before_update = true;

        let rule = Backup::new();
        assert!(rule.should_apply(&file, &config));
        let outcome = rule.execute(&file, &bridge, &config).unwrap();

        let RuleOutcome::Created { title, folder } = outcome else {
            panic!("expected a backup note");
        };
        assert!(title.starts_with("Foo_backup_"));
        assert_eq!(bridge.note_body(&title, &folder).as_deref(), Some("old body"));
    }

    #[test]
    fn backup_without_existing_note_is_no_op() {
        let temp = TempDir::new().unwrap();
        let file = write(&temp, "Foo.md", "body");
        let bridge = MemoryBridge::new();

        let outcome = Backup::new().execute(&file, &bridge, &config()).unwrap();
        assert!(matches!(outcome, RuleOutcome::NoOp { .. }));
        assert_eq!(bridge.mutation_count(), 0);
    }

    #[test]
    fn backup_skips_excluded_and_oversize_files() {
        let temp = TempDir::new().unwrap();
        let mut config = config();
        config.sync_rules.backup_before_update = true;
        let rule = Backup::new();

        let excluded = write(&temp, "_private.md", "body");
        assert!(!rule.should_apply(&excluded, &config));

        let large = write(&temp, "Large.md", &"x".repeat(2048));
        config.sync_rules.max_file_size_mb = 0.001;
        assert!(!rule.should_apply(&large, &config));
    }
}
