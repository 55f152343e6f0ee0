//! Time-based rules keyed on file timestamps and the wall clock
//!
//! Gates (`modified-today`, `created-since-24h`, ...) sync a file through
//! [`UpdateExisting`] when its timestamp qualifies. Windows
//! (`not-modified-recently-5m`, `weekday-only`, `business-hours-09-18`) are
//! pure filters with no effect of their own.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, TimeDelta, Timelike, Weekday};
use tracing::warn;

use super::basic::{UpdateExisting, meta_accessors};
use super::layout::NoteLayout;
use super::rule::{RuleKind, RuleMeta, RuleOutcome, SyncRule};
use crate::Result;
use crate::bridge::NotesBridge;
use crate::config::SyncConfig;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Local>;
}

/// The local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// What a [`TimeRule`] checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCondition {
    /// Modified on today's calendar date
    ModifiedToday,
    /// Modified within the last `hours`
    ModifiedSince { hours: u32 },
    /// Created on today's calendar date
    CreatedToday,
    /// Created within the last `hours`
    CreatedSince { hours: u32 },
    /// Untouched for at least `minutes`, so an editor is likely done with it
    NotModifiedRecently { minutes: u32 },
    /// Monday through Friday
    WeekdayOnly,
    /// `start <= hour < end`, local time
    BusinessHours { start: u32, end: u32 },
}

impl TimeCondition {
    fn rule_name(&self) -> String {
        match self {
            Self::ModifiedToday => "modified-today".to_string(),
            Self::ModifiedSince { hours } => format!("modified-since-{}h", hours),
            Self::CreatedToday => "created-today".to_string(),
            Self::CreatedSince { hours } => format!("created-since-{}h", hours),
            Self::NotModifiedRecently { minutes } => format!("not-modified-recently-{}m", minutes),
            Self::WeekdayOnly => "weekday-only".to_string(),
            Self::BusinessHours { start, end } => format!("business-hours-{:02}-{:02}", start, end),
        }
    }

    fn default_priority(&self) -> i32 {
        match self {
            Self::NotModifiedRecently { .. } => 85,
            Self::WeekdayOnly | Self::BusinessHours { .. } => 75,
            _ => 70,
        }
    }

    /// Gates sync through [`UpdateExisting`]; the rest only filter
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            Self::ModifiedToday
                | Self::ModifiedSince { .. }
                | Self::CreatedToday
                | Self::CreatedSince { .. }
        )
    }
}

fn modified(file: &Path) -> io::Result<DateTime<Local>> {
    Ok(fs::metadata(file)?.modified()?.into())
}

/// Creation time, or modification time where the platform has none
fn created(file: &Path) -> io::Result<DateTime<Local>> {
    let metadata = fs::metadata(file)?;
    let time: SystemTime = metadata.created().or_else(|_| metadata.modified())?;
    Ok(time.into())
}

/// A rule deciding on file timestamps or the current time
#[derive(Debug, Clone)]
pub struct TimeRule {
    meta: RuleMeta,
    condition: TimeCondition,
    kind: RuleKind,
    clock: Arc<dyn Clock>,
    update: UpdateExisting,
}

impl TimeRule {
    pub fn new(condition: TimeCondition) -> Self {
        let kind = if condition.is_gate() {
            RuleKind::Effect
        } else {
            RuleKind::Filter
        };
        Self {
            meta: RuleMeta::new(condition.rule_name(), condition.default_priority()),
            condition,
            kind,
            clock: Arc::new(SystemClock),
            update: UpdateExisting::new(),
        }
    }

    pub fn modified_today() -> Self {
        Self::new(TimeCondition::ModifiedToday)
    }

    pub fn modified_since(hours: u32) -> Self {
        Self::new(TimeCondition::ModifiedSince { hours })
    }

    pub fn created_today() -> Self {
        Self::new(TimeCondition::CreatedToday)
    }

    pub fn created_since(hours: u32) -> Self {
        Self::new(TimeCondition::CreatedSince { hours })
    }

    pub fn not_modified_recently(minutes: u32) -> Self {
        Self::new(TimeCondition::NotModifiedRecently { minutes })
    }

    pub fn weekday_only() -> Self {
        Self::new(TimeCondition::WeekdayOnly)
    }

    pub fn business_hours(start: u32, end: u32) -> Self {
        Self::new(TimeCondition::BusinessHours { start, end })
    }

    /// Turn a gate into a filter that only vetoes files
    pub fn as_filter(mut self) -> Self {
        self.kind = RuleKind::Filter;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Layout used when a gate syncs the file
    pub fn with_layout(mut self, layout: NoteLayout) -> Self {
        self.update = self.update.with_layout(layout);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.meta.priority = priority;
        self
    }

    pub fn condition(&self) -> TimeCondition {
        self.condition
    }

    fn since(&self, hours: u32) -> DateTime<Local> {
        self.clock.now() - TimeDelta::hours(i64::from(hours))
    }

    fn holds(&self, file: &Path) -> io::Result<bool> {
        let now = self.clock.now();
        Ok(match self.condition {
            TimeCondition::ModifiedToday => modified(file)?.date_naive() == now.date_naive(),
            TimeCondition::ModifiedSince { hours } => modified(file)? >= self.since(hours),
            TimeCondition::CreatedToday => created(file)?.date_naive() == now.date_naive(),
            TimeCondition::CreatedSince { hours } => created(file)? >= self.since(hours),
            TimeCondition::NotModifiedRecently { minutes } => {
                now - modified(file)? >= TimeDelta::minutes(i64::from(minutes))
            }
            TimeCondition::WeekdayOnly => !matches!(now.weekday(), Weekday::Sat | Weekday::Sun),
            TimeCondition::BusinessHours { start, end } => (start..end).contains(&now.hour()),
        })
    }
}

impl SyncRule for TimeRule {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        self.kind
    }

    /// A disabled window filter lets every file through.
    ///
    /// When file times cannot be read, a settle window lets the file
    /// through; every other condition rejects it.
    fn should_apply(&self, file: &Path, _config: &SyncConfig) -> bool {
        if !self.meta.enabled {
            return !self.condition.is_gate();
        }
        self.holds(file).unwrap_or_else(|e| {
            warn!(rule = %self.meta.name, file = %file.display(), error = %e, "Failed to read file times");
            matches!(self.condition, TimeCondition::NotModifiedRecently { .. })
        })
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        match self.kind {
            RuleKind::Effect => self.update.execute(file, bridge, config),
            _ => Ok(RuleOutcome::no_op("time window satisfied")),
        }
    }

    fn title(&self, file: &Path, config: &SyncConfig) -> String {
        self.update.title(file, config)
    }

    fn content(&self, file: &Path, config: &SyncConfig) -> String {
        self.update.content(file, config)
    }

    fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        self.update.folder(file, config)
    }
}
