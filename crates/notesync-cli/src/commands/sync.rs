//! Sync command implementations
//!
//! Translates the command-line options into a rule set, runs the engine and
//! prints a per-file report.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use notesync_core::rules::{
    Backup, ContentFilter, CreateNew, DryRun, FileType, ForceCreate, RuleSet, SizeLimit, TimeRule,
    UpdateExisting,
};
use notesync_core::{FileRecord, FileVerdict, SyncEngine, SyncStats};
use tracing::info;

use crate::cli::{SyncMode, SyncOptions};
use crate::context::Context;
use crate::error::{CliError, Result};

/// Build the rule set for a sync command.
///
/// The mode picks the effect rule. Time, size and content options add
/// filters that veto files before anything is written.
pub fn build_rules(options: &SyncOptions) -> Result<RuleSet> {
    let mut rules = match options.mode {
        SyncMode::Project => SyncEngine::default_rules(),
        SyncMode::Update => RuleSet::new()
            .with_rule(DryRun::new())
            .with_rule(Backup::new())
            .with_rule(UpdateExisting::new())
            .with_rule(FileType::new()),
        SyncMode::CreateOnly => RuleSet::new()
            .with_rule(DryRun::new())
            .with_rule(CreateNew::new())
            .with_rule(FileType::new()),
        SyncMode::ForceCreate => RuleSet::new()
            .with_rule(DryRun::new())
            .with_rule(ForceCreate::new())
            .with_rule(FileType::new()),
    };

    if options.only_today {
        rules.add_rule(Box::new(TimeRule::modified_today().as_filter()));
    }
    if options.only_created_today {
        rules.add_rule(Box::new(TimeRule::created_today().as_filter()));
    }
    if let Some(hours) = options.modified_since {
        rules.add_rule(Box::new(TimeRule::modified_since(hours).as_filter()));
    }
    if let Some(max_size) = options.max_size {
        if max_size <= 0.0 {
            return Err(CliError::user("--max-size must be a positive number of megabytes"));
        }
        rules.add_rule(Box::new(SizeLimit::new(Some(max_size))));
    }
    if !options.require.is_empty() || !options.exclude.is_empty() {
        let required: Vec<&str> = options.require.iter().map(String::as_str).collect();
        let excluded: Vec<&str> = options.exclude.iter().map(String::as_str).collect();
        rules.add_rule(Box::new(ContentFilter::new(&required, &excluded)?));
    }

    info!(mode = ?options.mode, rules = rules.len(), "Built rule set");
    Ok(rules)
}

/// Run the sync-file command
pub fn run_sync_file(context: &Context, file: &Path, options: &SyncOptions) -> Result<()> {
    if !file.exists() {
        return Err(CliError::user(format!("File not found: {}", file.display())));
    }

    println!(
        "{} Syncing {}...",
        "=>".blue().bold(),
        display_name(file).cyan()
    );

    let engine = context.engine(build_rules(options)?)?;
    let stats = engine.sync_file(file);
    report(&stats, context.dry_run)
}

/// Run the sync-folder command
pub fn run_sync_folder(
    context: &Context,
    folder: &Path,
    recursive: bool,
    options: &SyncOptions,
) -> Result<()> {
    println!(
        "{} Syncing folder {}{}...",
        "=>".blue().bold(),
        folder.display().to_string().cyan(),
        if recursive { " (recursive)" } else { "" }
    );

    let engine = context.engine(build_rules(options)?)?;
    let stats = engine.sync_folder(folder, recursive)?;
    if stats.total_files == 0 {
        println!("{} No Markdown files found.", "OK".green().bold());
        return Ok(());
    }
    report(&stats, context.dry_run)
}

/// Run the sync-files command
pub fn run_sync_files(
    context: &Context,
    files: &[PathBuf],
    file_list: Option<&Path>,
    options: &SyncOptions,
) -> Result<()> {
    let mut all_files = files.to_vec();
    if let Some(list) = file_list {
        let content = fs::read_to_string(list).map_err(|e| {
            CliError::user(format!("Failed to read file list {}: {}", list.display(), e))
        })?;
        all_files.extend(parse_file_list(&content));
    }

    if all_files.is_empty() {
        return Err(CliError::user("No files to sync"));
    }

    println!(
        "{} Syncing {} file(s)...",
        "=>".blue().bold(),
        all_files.len()
    );

    let engine = context.engine(build_rules(options)?)?;
    let stats = engine.sync_files(&all_files);
    report(&stats, context.dry_run)
}

/// Paths listed one per line; blank lines and `#` comments are skipped
pub fn parse_file_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

/// Print one line per file and a summary; fail if any file failed
fn report(stats: &SyncStats, dry_run: bool) -> Result<()> {
    for record in &stats.records {
        print_record(record, dry_run);
    }

    println!();
    let summary = format!(
        "{} of {} file(s) synced, {} failed, {} skipped in {:.2}s",
        stats.success_count,
        stats.total_files,
        stats.failure_count,
        stats.skipped_count,
        stats.duration_secs()
    );
    if stats.is_success() {
        let label = if dry_run { "DRY RUN" } else { "OK" };
        println!("{} {}", label.green().bold(), summary);
        Ok(())
    } else {
        println!("{} {}", "FAILED".red().bold(), summary);
        Err(CliError::Reported)
    }
}

fn print_record(record: &FileRecord, dry_run: bool) {
    let name = display_name(&record.path);
    match record.verdict {
        FileVerdict::Synced => {
            println!("   {} {}", "+".green(), name);
            if dry_run {
                for action in record.planned_actions() {
                    println!("     {}", action.dimmed());
                }
            }
        }
        FileVerdict::Failed => {
            let reason = record.failure_reason().unwrap_or("unknown error");
            println!("   {} {}: {}", "!".red(), name, reason);
        }
        FileVerdict::Skipped | FileVerdict::Ignored => {
            let reason = record.message.as_deref().unwrap_or("skipped");
            println!("   {} {} ({})", "-".yellow(), name, reason.dimmed());
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(mode: SyncMode) -> SyncOptions {
        SyncOptions {
            mode,
            only_today: false,
            only_created_today: false,
            modified_since: None,
            max_size: None,
            require: Vec::new(),
            exclude: Vec::new(),
        }
    }

    fn names(rules: &RuleSet) -> Vec<String> {
        rules.iter().map(|rule| rule.name().to_string()).collect()
    }

    #[test]
    fn project_mode_uses_default_rules() {
        let rules = build_rules(&options(SyncMode::Project)).unwrap();
        assert_eq!(names(&rules), vec!["dry-run", "auto-sync", "file-type"]);
    }

    #[test]
    fn create_only_mode_swaps_effect_rule() {
        let rules = build_rules(&options(SyncMode::CreateOnly)).unwrap();
        assert_eq!(names(&rules), vec!["dry-run", "create-new", "file-type"]);
    }

    #[test]
    fn update_mode_includes_backup() {
        let rules = build_rules(&options(SyncMode::Update)).unwrap();
        assert_eq!(
            names(&rules),
            vec!["dry-run", "backup", "update-existing", "file-type"]
        );
    }

    #[test]
    fn filters_are_added_from_options() {
        let mut opts = options(SyncMode::ForceCreate);
        opts.modified_since = Some(6);
        opts.max_size = Some(2.0);
        opts.require = vec!["publish".to_string()];

        let rules = build_rules(&opts).unwrap();
        let names = names(&rules);

        assert!(names.contains(&"force-create".to_string()));
        assert!(names.contains(&"modified-since-6h".to_string()));
        assert!(names.contains(&"size-limit".to_string()));
        assert!(names.contains(&"content-filter".to_string()));
    }

    #[test]
    fn invalid_require_pattern_is_an_error() {
        let mut opts = options(SyncMode::Update);
        opts.require = vec!["(unclosed".to_string()];
        assert!(build_rules(&opts).is_err());
    }

    #[test]
    fn non_positive_max_size_is_rejected() {
        let mut opts = options(SyncMode::Update);
        opts.max_size = Some(0.0);
        assert!(build_rules(&opts).is_err());
    }

    #[test]
    fn file_list_skips_blanks_and_comments() {
        let files = parse_file_list("a.md\n\n  # comment\n  docs/b.md  \n");
        assert_eq!(files, vec![PathBuf::from("a.md"), PathBuf::from("docs/b.md")]);
    }
}
