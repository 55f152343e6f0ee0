//! Rules that look at file names and contents

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, error};

use super::basic::meta_accessors;
use super::defaults;
use super::rule::{RuleKind, RuleMeta, RuleOutcome, SyncRule};
use crate::Result;
use crate::bridge::NotesBridge;
use crate::config::SyncConfig;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

static LEVEL_ONE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap());

static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^---\n(.*?)\n---\n(.*)$").unwrap());

fn derivation_only() -> Result<RuleOutcome> {
    Ok(RuleOutcome::no_op("derivation only"))
}

fn filter_only() -> Result<RuleOutcome> {
    Ok(RuleOutcome::no_op("filter passed"))
}

/// Prepends an emoji to the title based on path keywords
#[derive(Debug, Clone)]
pub struct TitlePrefix {
    meta: RuleMeta,
    prefixes: Vec<(String, String)>,
}

impl TitlePrefix {
    pub const NAME: &'static str = "title-prefix";

    pub fn new() -> Self {
        Self::with_prefixes([
            ("claude", "🤖 "),
            ("work", "💼 "),
            ("personal", "👤 "),
            ("tech", "🔧 "),
            ("notes", "📝 "),
            ("todo", "✅ "),
            ("draft", "📄 "),
        ])
    }

    /// Keywords are tried in order; the first contained in the path wins
    pub fn with_prefixes<I, K, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
            prefixes: prefixes
                .into_iter()
                .map(|(keyword, prefix)| (keyword.into().to_lowercase(), prefix.into()))
                .collect(),
        }
    }
}

impl Default for TitlePrefix {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for TitlePrefix {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        derivation_only()
    }

    fn title(&self, file: &Path, config: &SyncConfig) -> String {
        let base = defaults::title(file, config);
        let path = file.to_string_lossy().to_lowercase();
        match self
            .prefixes
            .iter()
            .find(|(keyword, _)| path.contains(keyword.as_str()))
        {
            Some((_, prefix)) => format!("{}{}", prefix, base),
            None => base,
        }
    }
}

/// Requires and excludes regular expressions in the file text.
///
/// Patterns match case-insensitively with `^`/`$` anchored per line. An
/// unreadable file never passes.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    meta: RuleMeta,
    required: Vec<Regex>,
    excluded: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .map_err(Into::into)
        })
        .collect()
}

impl ContentFilter {
    pub const NAME: &'static str = "content-filter";

    pub fn new(required: &[&str], excluded: &[&str]) -> Result<Self> {
        Ok(Self {
            meta: RuleMeta::new(Self::NAME, 80),
            required: compile(required)?,
            excluded: compile(excluded)?,
        })
    }
}

impl SyncRule for ContentFilter {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Filter
    }

    fn should_apply(&self, file: &Path, config: &SyncConfig) -> bool {
        if !self.meta.enabled {
            return true;
        }
        let text = match defaults::read_text(file, &config.sync_rules.encoding) {
            Ok(text) => text,
            Err(e) => {
                error!(file = %file.display(), error = %e, "Failed to read file for content filter");
                return false;
            }
        };

        if let Some(missing) = self.required.iter().find(|re| !re.is_match(&text)) {
            debug!(file = %file.display(), pattern = missing.as_str(), "Missing required pattern");
            return false;
        }
        if let Some(found) = self.excluded.iter().find(|re| re.is_match(&text)) {
            debug!(file = %file.display(), pattern = found.as_str(), "Contains excluded pattern");
            return false;
        }
        true
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        filter_only()
    }
}

/// Keeps files between a minimum byte size and a maximum size in MB.
///
/// Without an explicit maximum, `sync_rules.max_file_size_mb` is used.
#[derive(Debug, Clone)]
pub struct SizeLimit {
    meta: RuleMeta,
    max_size_mb: Option<f64>,
    min_size_bytes: u64,
}

impl SizeLimit {
    pub const NAME: &'static str = "size-limit";

    pub fn new(max_size_mb: Option<f64>) -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 90),
            max_size_mb,
            min_size_bytes: 10,
        }
    }

    pub fn with_min_size_bytes(mut self, min_size_bytes: u64) -> Self {
        self.min_size_bytes = min_size_bytes;
        self
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SyncRule for SizeLimit {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Filter
    }

    fn should_apply(&self, file: &Path, config: &SyncConfig) -> bool {
        if !self.meta.enabled {
            return true;
        }
        let size = match fs::metadata(file) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                error!(file = %file.display(), error = %e, "Failed to check file size");
                return false;
            }
        };

        if size < self.min_size_bytes {
            debug!(file = %file.display(), size, "File too small");
            return false;
        }
        let max_mb = self
            .max_size_mb
            .unwrap_or(config.sync_rules.max_file_size_mb);
        if size as f64 > max_mb * BYTES_PER_MB {
            debug!(file = %file.display(), size, max_mb, "File too large");
            return false;
        }
        true
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        filter_only()
    }
}

/// One keyword route of [`FolderMapping`]
#[derive(Debug, Clone, Copy)]
struct Route {
    keyword: &'static str,
    /// `folder_mappings` entry that overrides the folder
    mapping_key: Option<&'static str>,
    folder: &'static str,
}

const fn route(
    keyword: &'static str,
    mapping_key: Option<&'static str>,
    folder: &'static str,
) -> Route {
    Route {
        keyword,
        mapping_key,
        folder,
    }
}

const ROUTES: &[Route] = &[
    route("claude", Some("claude"), "Claude Docs"),
    route("work", Some("work"), "Work Notes"),
    route("project", Some("work"), "Work Notes"),
    route("tech", Some("tech"), "Tech Docs"),
    route("code", Some("tech"), "Tech Docs"),
    route("programming", Some("tech"), "Tech Docs"),
    route("personal", Some("personal"), "Personal Notes"),
    route("diary", Some("personal"), "Personal Notes"),
    route("journal", Some("personal"), "Personal Notes"),
    route("todo", None, "Todo"),
    route("task", None, "Todo"),
    route("meeting", None, "Meetings"),
    route("draft", None, "Drafts"),
    route("temp", None, "Temp"),
];

/// Folder derivation with built-in keyword routes.
///
/// Routes are tried in a fixed order against the whole path; then a
/// `YYYY-MM-DD` file name goes to `Daily Notes` and a readme to `Readme`.
/// Otherwise the `default` mapping, then `default_folder`, is used.
#[derive(Debug, Clone)]
pub struct FolderMapping {
    meta: RuleMeta,
}

impl FolderMapping {
    pub const NAME: &'static str = "folder-mapping";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
        }
    }
}

impl Default for FolderMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for FolderMapping {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        derivation_only()
    }

    fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        let mappings = &config.sync_rules.folder_mappings;
        let path = file.to_string_lossy().to_lowercase();

        if let Some(route) = ROUTES.iter().find(|r| path.contains(r.keyword)) {
            let folder = route
                .mapping_key
                .and_then(|key| mappings.get(key))
                .unwrap_or(route.folder);
            debug!(file = %file.display(), keyword = route.keyword, folder, "Mapped folder");
            return folder.to_string();
        }

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if DATE_PREFIX.is_match(&name) {
            return "Daily Notes".to_string();
        }
        if name.to_lowercase().contains("readme") {
            return "Readme".to_string();
        }

        mappings
            .fallback()
            .unwrap_or(config.notes_config.default_folder.as_str())
            .to_string()
    }
}

/// Title from the first `# heading` of the file.
///
/// Applies only while `sync_rules.extract_title_from_content` is on.
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    meta: RuleMeta,
}

impl HeaderExtractor {
    pub const NAME: &'static str = "header-extractor";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
        }
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// First level-one heading of a Markdown text
pub fn first_heading(text: &str) -> Option<&str> {
    LEVEL_ONE_HEADING
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|heading| !heading.is_empty())
}

impl SyncRule for HeaderExtractor {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, config: &SyncConfig) -> bool {
        self.meta.enabled && config.sync_rules.extract_title_from_content
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        derivation_only()
    }

    fn title(&self, file: &Path, config: &SyncConfig) -> String {
        match defaults::read_text(file, &config.sync_rules.encoding) {
            Ok(text) => {
                if let Some(heading) = first_heading(&text) {
                    return defaults::with_title_affixes(heading, &config.notes_config);
                }
            }
            Err(e) => error!(file = %file.display(), error = %e, "Failed to extract title"),
        }
        defaults::title(file, config)
    }
}

/// Renders a leading front-matter block as a metadata section
#[derive(Debug, Clone)]
pub struct Metadata {
    meta: RuleMeta,
}

impl Metadata {
    pub const NAME: &'static str = "metadata";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace a `---` front-matter block with a `## 📋 Metadata` section.
///
/// Lines without a `:` are dropped; a block with no `key: value` lines
/// leaves the text untouched.
pub fn render_front_matter(text: &str) -> Option<String> {
    let caps = FRONT_MATTER.captures(text)?;
    let fields: Vec<String> = caps[1]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| format!("**{}**: {}", key.trim(), value.trim()))
        .collect();
    if fields.is_empty() {
        return None;
    }
    Some(format!("## 📋 Metadata\n{}\n\n{}", fields.join("\n"), &caps[2]))
}

impl SyncRule for Metadata {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        derivation_only()
    }

    fn content(&self, file: &Path, config: &SyncConfig) -> String {
        let content = defaults::content(file, config);
        render_front_matter(&content).unwrap_or(content)
    }
}
