//! The rule contract shared by every rule family

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::defaults;
use crate::Result;
use crate::bridge::NotesBridge;
use crate::config::SyncConfig;

/// Name, priority and switch of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    /// Rule name; removal and toggling match on it
    pub name: String,
    /// Higher runs earlier
    pub priority: i32,
    pub enabled: bool,
}

impl RuleMeta {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
        }
    }
}

impl fmt::Display for RuleMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(priority={}, enabled={})",
            self.name, self.priority, self.enabled
        )
    }
}

/// How the engine treats a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Executes against the bridge when it applies
    Effect,
    /// Never executed; an enabled filter that does not apply vetoes the file
    Filter,
    /// Only supplies title, content or folder derivations to other rules
    Derivation,
}

/// What a rule did for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// A new note was created
    Created { title: String, folder: String },
    /// An existing note was updated
    Updated { title: String, folder: String },
    /// The target folder exists (possibly just created)
    FolderReady { folder: String },
    /// Nothing needed doing; counts as success
    NoOp { reason: String },
    /// Dry run: what would have happened
    Planned { actions: Vec<String> },
    /// The rule could not do its job
    Failed { reason: String },
}

impl RuleOutcome {
    pub fn no_op(reason: impl Into<String>) -> Self {
        Self::NoOp {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { title, folder } => write!(f, "created '{}' in '{}'", title, folder),
            Self::Updated { title, folder } => write!(f, "updated '{}' in '{}'", title, folder),
            Self::FolderReady { folder } => write!(f, "folder '{}' ready", folder),
            Self::NoOp { reason } => write!(f, "no change: {}", reason),
            Self::Planned { actions } => write!(f, "{}", actions.join("; ")),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// A named, prioritized sync policy.
///
/// `should_apply` is a pure predicate. `execute` reports expected failures
/// (bridge errors, unreadable files) as [`RuleOutcome::Failed`]; an `Err` is
/// reserved for the unexpected and is recorded by the engine as a failure of
/// this rule.
///
/// `title`, `content` and `folder` default to the shared derivations in
/// [`defaults`]; rule families override them.
pub trait SyncRule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    fn meta_mut(&mut self) -> &mut RuleMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn priority(&self) -> i32 {
        self.meta().priority
    }

    fn is_enabled(&self) -> bool {
        self.meta().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.meta_mut().enabled = enabled;
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Effect
    }

    /// Whether this rule applies to the file
    fn should_apply(&self, file: &Path, config: &SyncConfig) -> bool;

    /// Perform (or, through a dry-run bridge, plan) this rule's effect
    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome>;

    fn title(&self, file: &Path, config: &SyncConfig) -> String {
        defaults::title(file, config)
    }

    fn content(&self, file: &Path, config: &SyncConfig) -> String {
        defaults::content(file, config)
    }

    fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        defaults::folder(file, config)
    }
}

impl fmt::Debug for dyn SyncRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRule")
            .field("meta", self.meta())
            .field("kind", &self.kind())
            .finish()
    }
}
