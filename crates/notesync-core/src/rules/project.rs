//! Project-aware rules
//!
//! Files are filed under `<project_root_folder>/<project>` where the project
//! is found by walking up from the file to the nearest directory carrying a
//! project marker (`.git`, `package.json`, `Assets` + `Scripts`, ...).
//! [`AutoSync`] combines the folder, title and content rules of this module
//! into one end-to-end sync and is the default sync path.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error, info};

use super::basic::{WriteMode, meta_accessors, write_note};
use super::defaults;
use super::layout::NoteLayout;
use super::rule::{RuleKind, RuleMeta, RuleOutcome, SyncRule};
use crate::Result;
use crate::bridge::{NotesBridge, normalize_folder};
use crate::config::SyncConfig;
use crate::transform::{ContentTransform, LINE_BREAK, MarkdownConverter, PARAGRAPH_BREAK};

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-.]").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_\-]+").unwrap());

/// Folder used when no project can be identified
pub const OTHER_PROJECT: &str = "Other";

/// Marker sets; a directory is a project root when it holds every entry of a set
const PROJECT_MARKERS: &[&[&str]] = &[
    &["Assets", "Scripts"],
    &["ProjectSettings"],
    &["Packages"],
    &[".git"],
    &["package.json"],
    &["node_modules"],
    &["requirements.txt"],
    &["pyproject.toml"],
    &["setup.py"],
    &["main.py"],
    &["config.json"],
    &["src", "main"],
    &["lib", "include"],
    &["docs"],
    &["README.md"],
    &["README.rst"],
];

/// Directory names too generic to name a project
const GENERIC_DIRS: &[&str] = &[
    "documents",
    "desktop",
    "downloads",
    "tmp",
    "temp",
    "users",
    "home",
    "volumes",
];

/// Make a project name safe to use as a Notes folder.
///
/// Punctuation other than `-`, `_` and `.` is dropped, runs of whitespace,
/// `_` and `-` become one `_`, and separators are trimmed from both ends.
/// Case is preserved. A name with nothing left becomes `Unknown`.
pub fn sanitize_project_name(name: &str) -> String {
    let cleaned = DISALLOWED.replace_all(name, "");
    let collapsed = SEPARATORS.replace_all(&cleaned, "_");
    let trimmed = collapsed.trim_matches(|c| matches!(c, '_' | '-' | '.'));
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Finds the project a file belongs to
#[derive(Debug, Clone, Default)]
pub struct ProjectLocator {
    ceiling: Option<PathBuf>,
}

impl ProjectLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never look for markers above this directory
    pub fn with_ceiling(mut self, ceiling: impl Into<PathBuf>) -> Self {
        self.ceiling = Some(ceiling.into());
        self
    }

    fn is_project_root(dir: &Path) -> bool {
        PROJECT_MARKERS
            .iter()
            .any(|set| set.iter().all(|marker| dir.join(marker).exists()))
    }

    /// Raw (unsanitized) project name for a file.
    ///
    /// Walks up from the file's directory to the first project root, never
    /// inspecting the filesystem root. Without a marker, the nearest
    /// directory name that is not a generic one (`Documents`, `tmp`, ...)
    /// is used.
    pub fn locate(&self, file: &Path) -> Option<String> {
        let file = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
        let ceiling = self
            .ceiling
            .as_deref()
            .map(|c| std::path::absolute(c).unwrap_or_else(|_| c.to_path_buf()));

        let mut current = file.parent();
        while let Some(dir) = current {
            let Some(parent) = dir.parent() else {
                break;
            };
            if Self::is_project_root(dir) {
                let name = dir.file_name()?.to_string_lossy().into_owned();
                debug!(file = %file.display(), project = %name, "Found project root");
                return Some(name);
            }
            if ceiling.as_deref() == Some(dir) {
                break;
            }
            current = Some(parent);
        }

        file.parent()?
            .components()
            .rev()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .find(|name| !GENERIC_DIRS.contains(&name.to_lowercase().as_str()))
    }
}

/// Make sure a folder path exists, creating missing segments
pub(crate) fn ensure_folder(rule: &str, bridge: &dyn NotesBridge, folder: &str) -> RuleOutcome {
    let ready = RuleOutcome::FolderReady {
        folder: folder.to_string(),
    };
    match bridge.folder_exists(folder) {
        Ok(true) => return ready,
        Ok(false) => {}
        Err(e) => {
            error!(rule, folder, error = %e, "Failed to check folder");
            return RuleOutcome::failed(e.to_string());
        }
    }
    match bridge.create_folder(folder) {
        Ok(()) => {
            info!(rule, folder, "Created folder");
            ready
        }
        Err(e) => {
            error!(rule, folder, error = %e, "Failed to create folder");
            RuleOutcome::failed(format!("could not create folder '{}': {}", folder, e))
        }
    }
}

impl NoteLayout {
    /// Title, body and folder as [`AutoSync`] derives them
    pub fn project(locator: ProjectLocator) -> Self {
        NoteLayout::new()
            .with_title(ProjectTitle::new())
            .with_content(ProjectContent::new())
            .with_folder(ProjectMapping::new().with_locator(locator))
    }
}

/// Files notes under `<project_root_folder>/<project>`
#[derive(Debug, Clone)]
pub struct ProjectMapping {
    meta: RuleMeta,
    locator: ProjectLocator,
}

impl ProjectMapping {
    pub const NAME: &'static str = "project-mapping";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 90),
            locator: ProjectLocator::new(),
        }
    }

    pub fn with_locator(mut self, locator: ProjectLocator) -> Self {
        self.locator = locator;
        self
    }
}

impl Default for ProjectMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for ProjectMapping {
    meta_accessors!();

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    /// Ensure the project folder exists
    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        let folder = self.folder(file, config);
        Ok(ensure_folder(self.name(), bridge, &folder))
    }

    fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        let project = match self.locator.locate(file) {
            Some(name) => sanitize_project_name(&name),
            None => OTHER_PROJECT.to_string(),
        };
        let root = &config.notes_config.project_root_folder;
        let folder = normalize_folder(&format!("{}/{}", root, project));
        debug!(file = %file.display(), folder, "Mapped project folder");
        folder
    }
}

/// Titles notes with the bare file stem
#[derive(Debug, Clone)]
pub struct ProjectTitle {
    meta: RuleMeta,
}

impl ProjectTitle {
    pub const NAME: &'static str = "project-title";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
        }
    }
}

impl Default for ProjectTitle {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for ProjectTitle {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        Ok(RuleOutcome::no_op("derivation only"))
    }

    fn title(&self, file: &Path, _config: &SyncConfig) -> String {
        defaults::file_stem(file)
    }
}

/// Note body: the file stem, a paragraph break, then the converted text.
///
/// With `convert_markdown` off, the text is kept as is apart from line
/// breaks.
#[derive(Clone)]
pub struct ProjectContent {
    meta: RuleMeta,
    transform: Arc<dyn ContentTransform>,
}

impl std::fmt::Debug for ProjectContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContent")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl ProjectContent {
    pub const NAME: &'static str = "project-content";

    pub fn new() -> Self {
        Self::with_transform(MarkdownConverter::new())
    }

    pub fn with_transform(transform: impl ContentTransform + 'static) -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 85),
            transform: Arc::new(transform),
        }
    }
}

impl Default for ProjectContent {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for ProjectContent {
    meta_accessors!();

    fn kind(&self) -> RuleKind {
        RuleKind::Derivation
    }

    fn should_apply(&self, _file: &Path, _config: &SyncConfig) -> bool {
        self.meta.enabled
    }

    fn execute(&self, _: &Path, _: &dyn NotesBridge, _: &SyncConfig) -> Result<RuleOutcome> {
        Ok(RuleOutcome::no_op("derivation only"))
    }

    fn content(&self, file: &Path, config: &SyncConfig) -> String {
        let text = match defaults::read_text(file, &config.sync_rules.encoding) {
            Ok(text) => text,
            Err(e) => {
                error!(file = %file.display(), error = %e, "Failed to read file");
                return format!("❌ Failed to read file: {}", e);
            }
        };
        let body = if config.notes_config.convert_markdown {
            self.transform.convert(&text)
        } else {
            text.replace('\n', LINE_BREAK)
        };
        format!("{}{}{}", defaults::file_stem(file), PARAGRAPH_BREAK, body)
    }
}

/// Project-aware end-to-end sync.
///
/// Ensures the project folder, then updates the note titled with the file
/// stem (or creates it when missing or when `auto_update` is off).
#[derive(Debug, Clone)]
pub struct AutoSync {
    meta: RuleMeta,
    mapping: ProjectMapping,
    title: ProjectTitle,
    content: ProjectContent,
}

impl AutoSync {
    pub const NAME: &'static str = "auto-sync";

    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(Self::NAME, 100),
            mapping: ProjectMapping::new(),
            title: ProjectTitle::new(),
            content: ProjectContent::new(),
        }
    }

    pub fn with_locator(mut self, locator: ProjectLocator) -> Self {
        self.mapping = self.mapping.with_locator(locator);
        self
    }

    pub fn with_transform(mut self, transform: impl ContentTransform + 'static) -> Self {
        self.content = ProjectContent::with_transform(transform);
        self
    }
}

impl Default for AutoSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRule for AutoSync {
    meta_accessors!();

    fn should_apply(&self, file: &Path, config: &SyncConfig) -> bool {
        self.meta.enabled
            && defaults::check_size(file, config)
            && !defaults::should_ignore(file, config)
    }

    fn execute(
        &self,
        file: &Path,
        bridge: &dyn NotesBridge,
        config: &SyncConfig,
    ) -> Result<RuleOutcome> {
        let folder = self.folder(file, config);
        if let failed @ RuleOutcome::Failed { .. } = ensure_folder(self.name(), bridge, &folder) {
            return Ok(failed);
        }

        let title = self.title(file, config);
        let content = self.content(file, config);
        let mode = if config.sync_rules.auto_update {
            WriteMode::Upsert
        } else {
            WriteMode::AlwaysCreate
        };
        Ok(write_note(self.name(), bridge, &title, &content, &folder, mode))
    }

    fn title(&self, file: &Path, config: &SyncConfig) -> String {
        self.title.title(file, config)
    }

    fn content(&self, file: &Path, config: &SyncConfig) -> String {
        self.content.content(file, config)
    }

    fn folder(&self, file: &Path, config: &SyncConfig) -> String {
        self.mapping.folder(file, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeOp, MemoryBridge};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case("My Project!! v2.0", "My_Project_v2.0")]
    #[case("  spaced   out  ", "spaced_out")]
    #[case("a--b__c  d", "a_b_c_d")]
    #[case("_.-edge-._", "edge")]
    #[case("!!!", "Unknown")]
    #[case("", "Unknown")]
    #[case("Unity Game", "Unity_Game")]
    fn sanitizes_project_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_project_name(raw), expected);
    }

    fn tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("workspace").join("My Game");
        fs::create_dir_all(root.join("Assets")).unwrap();
        fs::create_dir_all(root.join("Scripts").join("docs-notes")).unwrap();
        fs::write(root.join("Scripts").join("docs-notes").join("plan.md"), "# Plan\nbody").unwrap();
        temp
    }

    #[test]
    fn locate_walks_up_to_marker() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let locator = ProjectLocator::new().with_ceiling(temp.path());
        assert_eq!(locator.locate(&file).as_deref(), Some("My Game"));
    }

    #[test]
    fn locate_falls_back_to_nearest_meaningful_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("research").join("tmp");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("idea.md");
        fs::write(&file, "idea").unwrap();

        let locator = ProjectLocator::new().with_ceiling(temp.path());
        assert_eq!(locator.locate(&file).as_deref(), Some("research"));
    }

    #[test]
    fn project_mapping_folder() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = ProjectMapping::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        assert_eq!(rule.folder(&file, &SyncConfig::default()), "Claude/My_Game");
    }

    #[test]
    fn project_mapping_creates_missing_folder() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = ProjectMapping::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        let bridge = MemoryBridge::new().with_folder("Claude");

        let outcome = rule.execute(&file, &bridge, &SyncConfig::default()).unwrap();
        assert_eq!(
            outcome,
            RuleOutcome::FolderReady {
                folder: "Claude/My_Game".into()
            }
        );
        assert!(bridge.folders().contains(&"Claude/My_Game".to_string()));

        let again = rule.execute(&file, &bridge, &SyncConfig::default()).unwrap();
        assert!(again.is_success());
        assert_eq!(bridge.call_count(BridgeOp::CreateFolder), 1);
    }

    #[test]
    fn project_mapping_reports_folder_failure() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = ProjectMapping::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        let bridge = MemoryBridge::new();
        bridge.fail_on(BridgeOp::CreateFolder);

        let outcome = rule.execute(&file, &bridge, &SyncConfig::default()).unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn project_title_is_bare_stem() {
        let mut config = SyncConfig::default();
        config.notes_config.title_prefix = "X-".into();
        config.notes_config.add_timestamp = true;
        assert_eq!(ProjectTitle::new().title(Path::new("/a/b/Design Doc.md"), &config), "Design Doc");
    }

    #[test]
    fn project_content_prefixes_title_line() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Plan.md");
        fs::write(&file, "# Goal\nShip it").unwrap();

        let mut config = SyncConfig::default();
        let converted = ProjectContent::new().content(&file, &config);
        assert!(converted.starts_with("Plan<br><br>"));
        assert!(converted.contains("Goal"));

        config.notes_config.convert_markdown = false;
        assert_eq!(
            ProjectContent::new().content(&file, &config),
            "Plan<br><br># Goal<br>Ship it"
        );

        let missing = ProjectContent::new().content(&temp.path().join("gone.md"), &config);
        assert!(missing.starts_with("❌ Failed to read file"));
    }

    #[test]
    fn auto_sync_creates_then_updates() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = AutoSync::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        let config = SyncConfig::default();
        let bridge = MemoryBridge::new();

        assert!(rule.should_apply(&file, &config));
        let first = rule.execute(&file, &bridge, &config).unwrap();
        assert_eq!(
            first,
            RuleOutcome::Created {
                title: "plan".into(),
                folder: "Claude/My_Game".into()
            }
        );
        let body = bridge.note_body("plan", "Claude/My_Game").unwrap();
        assert!(body.starts_with("plan<br><br>"));

        let second = rule.execute(&file, &bridge, &config).unwrap();
        assert!(matches!(second, RuleOutcome::Updated { .. }));
        assert_eq!(bridge.call_count(BridgeOp::CreateFolder), 1);
    }

    #[test]
    fn auto_sync_without_auto_update_duplicates() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = AutoSync::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        let mut config = SyncConfig::default();
        config.sync_rules.auto_update = false;
        let bridge = MemoryBridge::new();

        rule.execute(&file, &bridge, &config).unwrap();
        rule.execute(&file, &bridge, &config).unwrap();
        assert_eq!(bridge.call_count(BridgeOp::CreateNote), 2);
        assert_eq!(bridge.call_count(BridgeOp::UpdateNote), 0);
    }

    #[test]
    fn auto_sync_skips_ignored_and_oversized() {
        let temp = TempDir::new().unwrap();
        let ignored = temp.path().join("_private.md");
        fs::write(&ignored, "x").unwrap();
        let big = temp.path().join("big.md");
        fs::write(&big, "x".repeat(4096)).unwrap();

        let mut config = SyncConfig::default();
        let rule = AutoSync::new();
        assert!(!rule.should_apply(&ignored, &config));
        assert!(rule.should_apply(&big, &config));
        config.sync_rules.max_file_size_mb = 0.001;
        assert!(!rule.should_apply(&big, &config));
    }

    #[test]
    fn auto_sync_stops_when_folder_cannot_be_created() {
        let temp = tree();
        let file = temp
            .path()
            .join("workspace/My Game/Scripts/docs-notes/plan.md");
        let rule = AutoSync::new().with_locator(ProjectLocator::new().with_ceiling(temp.path()));
        let bridge = MemoryBridge::new();
        bridge.fail_on(BridgeOp::CreateFolder);

        let outcome = rule.execute(&file, &bridge, &SyncConfig::default()).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(bridge.call_count(BridgeOp::CreateNote), 0);
    }
}
