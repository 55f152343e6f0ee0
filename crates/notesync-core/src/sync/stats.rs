//! Per-file records and per-batch statistics

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::rules::RuleOutcome;

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileVerdict {
    /// Every applied rule succeeded (or, in a dry run, planned its work)
    Synced,
    /// At least one applied rule failed, or the file could not be used
    Failed,
    /// A filter vetoed the file or no rule applied
    Skipped,
    /// The file name matched `excluded_patterns`
    Ignored,
}

impl fmt::Display for FileVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Synced => "synced",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Ignored => "ignored",
        };
        f.write_str(label)
    }
}

/// One rule applied to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRecord {
    pub rule: String,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
}

/// Everything the engine did for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub verdict: FileVerdict,
    /// Applied rules in evaluation order
    pub rules: Vec<RuleRecord>,
    /// Why the file was skipped, ignored or rejected before any rule ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileRecord {
    pub(crate) fn new(path: impl Into<PathBuf>, verdict: FileVerdict) -> Self {
        Self {
            path: path.into(),
            verdict,
            rules: Vec::new(),
            message: None,
        }
    }

    pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Dry-run actions planned for this file
    pub fn planned_actions(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|record| match &record.outcome {
                RuleOutcome::Planned { actions } => actions.as_slice(),
                _ => &[][..],
            })
            .map(String::as_str)
    }

    /// First failure reason, if any rule failed
    pub fn failure_reason(&self) -> Option<&str> {
        self.rules
            .iter()
            .find_map(|record| match &record.outcome {
                RuleOutcome::Failed { reason } => Some(reason.as_str()),
                _ => None,
            })
            .or_else(|| match self.verdict {
                FileVerdict::Failed => self.message.as_deref(),
                _ => None,
            })
    }
}

/// Statistics for one batch.
///
/// Built by the engine for a single `sync_*` call and handed over when the
/// batch ends.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Skipped and ignored files
    pub skipped_count: usize,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub records: Vec<FileRecord>,
}

impl SyncStats {
    pub(crate) fn start() -> Self {
        let now = Local::now();
        Self {
            total_files: 0,
            success_count: 0,
            failure_count: 0,
            skipped_count: 0,
            start_time: now,
            end_time: now,
            records: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, record: FileRecord) {
        self.total_files += 1;
        match record.verdict {
            FileVerdict::Synced => self.success_count += 1,
            FileVerdict::Failed => self.failure_count += 1,
            FileVerdict::Skipped | FileVerdict::Ignored => self.skipped_count += 1,
        }
        self.records.push(record);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.end_time = Local::now();
        self
    }

    /// Wall-clock duration of the batch in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// True when no file failed
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Records of files that failed
    pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(|r| r.verdict == FileVerdict::Failed)
    }
}

/// Note counts of one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderInfo {
    pub name: String,
    pub note_count: usize,
}

/// Overview of the Notes account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotesInfo {
    pub account: String,
    pub folders: Vec<FolderInfo>,
    pub total_notes: usize,
}
