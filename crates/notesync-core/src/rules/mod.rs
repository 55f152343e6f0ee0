//! Sync rules
//!
//! A rule is a named, prioritized policy that decides whether a file is
//! synced and how. Every rule implements [`SyncRule`] and reports its
//! [`RuleKind`]:
//!
//! - **Effect** rules run against the bridge when they apply
//!   ([`UpdateExisting`], [`AutoSync`], [`ProjectMapping`], time gates)
//! - **Filter** rules only veto files ([`FileType`], [`ContentFilter`],
//!   [`SizeLimit`], time windows)
//! - **Derivation** rules supply a title, body or folder to effect rules
//!   through a [`NoteLayout`] ([`TitlePrefix`], [`FolderMapping`],
//!   [`HeaderExtractor`], [`Metadata`], [`ProjectTitle`], [`ProjectContent`])
//!
//! # Example
//!
//! ```
//! use notesync_core::rules::{FileType, FolderMapping, NoteLayout, RuleSet, UpdateExisting};
//!
//! let layout = NoteLayout::new().with_folder(FolderMapping::new());
//! let rules = RuleSet::new()
//!     .with_rule(FileType::new())
//!     .with_rule(UpdateExisting::new().with_layout(layout));
//!
//! let names: Vec<String> = rules.list_rules().into_iter().map(|m| m.name).collect();
//! assert_eq!(names, ["update-existing", "file-type"]);
//! ```

mod basic;
mod content;
pub mod defaults;
mod layout;
mod project;
mod rule;
mod set;
mod time;

pub use basic::{Backup, CreateNew, DryRun, FileType, ForceCreate, UpdateExisting};
pub use content::{
    ContentFilter, FolderMapping, HeaderExtractor, Metadata, SizeLimit, TitlePrefix,
    first_heading, render_front_matter,
};
pub use layout::NoteLayout;
pub use project::{
    AutoSync, OTHER_PROJECT, ProjectContent, ProjectLocator, ProjectMapping, ProjectTitle,
    sanitize_project_name,
};
pub use rule::{RuleKind, RuleMeta, RuleOutcome, SyncRule};
pub use set::RuleSet;
pub use time::{Clock, FixedClock, SystemClock, TimeCondition, TimeRule};
