//! SyncEngine implementation
//!
//! The engine runs a [`RuleSet`] over files, one file at a time, and turns the
//! rule outcomes into per-file records and batch statistics.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, error, info, warn};

use super::stats::{FileRecord, FileVerdict, FolderInfo, NotesInfo, RuleRecord, SyncStats};
use crate::bridge::{self, DryRunBridge, NotesBridge};
use crate::config::SyncConfig;
use crate::rules::{
    self, AutoSync, DryRun, FileType, NoteLayout, ProjectLocator, RuleKind, RuleOutcome, RuleSet,
    SyncRule,
};
use crate::{Error, Result};

/// Engine for synchronizing Markdown files into Notes
///
/// For each file the engine:
/// 1. rejects missing paths and non-files
/// 2. records excluded files as ignored
/// 3. lets every enabled filter rule veto the file
/// 4. executes every enabled, applicable effect rule in priority order
///
/// A failing rule does not stop later rules, and a failing file does not
/// stop the batch. With `dry_run` set, rules run against a proxy that
/// records mutations instead of performing them.
pub struct SyncEngine {
    config: SyncConfig,
    bridge: Box<dyn NotesBridge>,
    rules: RuleSet,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("account", &self.bridge.account())
            .field("dry_run", &self.config.dry_run)
            .field("rules", &self.rules)
            .finish()
    }
}

impl SyncEngine {
    /// Create an engine with [`SyncEngine::default_rules`]
    pub fn new(config: SyncConfig, bridge: Box<dyn NotesBridge>) -> Self {
        Self::with_rules(config, bridge, Self::default_rules())
    }

    pub fn with_rules(config: SyncConfig, bridge: Box<dyn NotesBridge>, rules: RuleSet) -> Self {
        info!(
            account = bridge.account(),
            rules = rules.len(),
            dry_run = config.dry_run,
            "Sync engine ready"
        );
        Self {
            config,
            bridge,
            rules,
        }
    }

    /// Dry-run reporting, project-aware sync and the Markdown file filter
    pub fn default_rules() -> RuleSet {
        RuleSet::new()
            .with_rule(DryRun::new().with_layout(NoteLayout::project(ProjectLocator::new())))
            .with_rule(AutoSync::new())
            .with_rule(FileType::new())
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn bridge(&self) -> &dyn NotesBridge {
        self.bridge.as_ref()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    /// Sync one file
    pub fn sync_file(&self, file: impl AsRef<Path>) -> SyncStats {
        self.sync_files([file])
    }

    /// Sync files in order, continuing past failures
    pub fn sync_files<I, P>(&self, files: I) -> SyncStats
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let planner = self
            .config
            .dry_run
            .then(|| DryRunBridge::new(self.bridge.as_ref()));

        let mut stats = SyncStats::start();
        for file in files {
            stats.record(self.process(file.as_ref(), planner.as_ref()));
        }
        let stats = stats.finish();

        info!(
            total = stats.total_files,
            success = stats.success_count,
            failed = stats.failure_count,
            skipped = stats.skipped_count,
            "Sync finished"
        );
        stats
    }

    /// Sync the `.md` files of a folder, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or is not a directory.
    pub fn sync_folder(&self, folder: impl AsRef<Path>, recursive: bool) -> Result<SyncStats> {
        let files = discover_markdown(folder.as_ref(), recursive)?;
        info!(
            folder = %folder.as_ref().display(),
            files = files.len(),
            recursive,
            "Syncing folder"
        );
        Ok(self.sync_files(files))
    }

    /// Folders of the account and how many notes each holds
    ///
    /// # Errors
    ///
    /// Returns an error if the folder list cannot be read. A folder whose
    /// notes cannot be listed is reported with zero notes.
    pub fn notes_info(&self) -> bridge::Result<NotesInfo> {
        let folders = self
            .bridge
            .get_folders()?
            .into_iter()
            .map(|name| {
                let note_count = match self.bridge.get_existing_notes(&name) {
                    Ok(notes) => notes.len(),
                    Err(e) => {
                        warn!(folder = %name, error = %e, "Failed to list notes");
                        0
                    }
                };
                FolderInfo { name, note_count }
            })
            .collect::<Vec<_>>();

        Ok(NotesInfo {
            account: self.bridge.account().to_string(),
            total_notes: folders.iter().map(|f| f.note_count).sum(),
            folders,
        })
    }

    fn process(&self, file: &Path, planner: Option<&DryRunBridge<'_>>) -> FileRecord {
        if !file.exists() {
            error!(file = %file.display(), "File not found");
            return FileRecord::new(file, FileVerdict::Failed).with_message("File not found");
        }
        if !file.is_file() {
            error!(file = %file.display(), "Not a file");
            return FileRecord::new(file, FileVerdict::Failed).with_message("Not a file");
        }

        if rules::defaults::should_ignore(file, &self.config) {
            debug!(file = %file.display(), "Ignored by exclusion pattern");
            return FileRecord::new(file, FileVerdict::Ignored)
                .with_message("matches an excluded pattern");
        }

        if let Some(filter) = self
            .rules
            .enabled()
            .filter(|rule| rule.kind() == RuleKind::Filter)
            .find(|rule| !rule.should_apply(file, &self.config))
        {
            debug!(file = %file.display(), rule = filter.name(), "Vetoed by filter");
            return FileRecord::new(file, FileVerdict::Skipped)
                .with_message(format!("filtered by {}", filter.name()));
        }

        let bridge: &dyn NotesBridge = match planner {
            Some(planner) => planner,
            None => self.bridge.as_ref(),
        };

        let mut record = FileRecord::new(file, FileVerdict::Skipped);
        for rule in self
            .rules
            .enabled()
            .filter(|rule| rule.kind() == RuleKind::Effect)
        {
            if !rule.should_apply(file, &self.config) {
                debug!(file = %file.display(), rule = rule.name(), "Rule does not apply");
                continue;
            }
            let outcome = self.run_rule(rule, file, bridge, planner);
            record.rules.push(RuleRecord {
                rule: rule.name().to_string(),
                outcome,
            });
        }

        record.verdict = if record.rules.is_empty() {
            FileVerdict::Skipped
        } else if record.rules.iter().any(|r| !r.outcome.is_success()) {
            FileVerdict::Failed
        } else {
            FileVerdict::Synced
        };
        if record.rules.is_empty() {
            record.message = Some("no applicable rule".to_string());
        }

        match record.verdict {
            FileVerdict::Failed => warn!(file = %file.display(), "Sync failed"),
            verdict => info!(file = %file.display(), %verdict, "Processed file"),
        }
        record
    }

    fn run_rule(
        &self,
        rule: &dyn SyncRule,
        file: &Path,
        bridge: &dyn NotesBridge,
        planner: Option<&DryRunBridge<'_>>,
    ) -> RuleOutcome {
        let outcome = match rule.execute(file, bridge, &self.config) {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = Error::RuleFailed {
                    rule: rule.name().to_string(),
                    message: e.to_string(),
                };
                error!(file = %file.display(), rule = rule.name(), error = %e, "Rule raised an error");
                RuleOutcome::failed(e.to_string())
            }
        };
        debug!(file = %file.display(), rule = rule.name(), %outcome, "Rule executed");

        let Some(planner) = planner else {
            return outcome;
        };
        let actions = planner.take_actions();
        match outcome {
            RuleOutcome::Failed { .. } => outcome,
            _ if actions.is_empty() => outcome,
            RuleOutcome::Planned { actions: mut own } => {
                own.extend(actions);
                RuleOutcome::Planned { actions: own }
            }
            _ => RuleOutcome::Planned { actions },
        }
    }
}

/// Markdown files of a folder, sorted
///
/// # Errors
///
/// Returns an error if the folder does not exist or is not a directory.
pub fn discover_markdown(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(Error::FolderNotFound {
            path: folder.to_path_buf(),
        });
    }
    if !folder.is_dir() {
        return Err(Error::NotADirectory {
            path: folder.to_path_buf(),
        });
    }

    let suffix = if recursive { "**/*.md" } else { "*.md" };
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&folder.to_string_lossy()),
        suffix
    );

    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}
