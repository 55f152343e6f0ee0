//! Typed configuration schema
//!
//! Every section and field is optional in the JSON document; missing values
//! fall back to the defaults below.

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key in `folder_mappings` that names the fallback folder
pub const DEFAULT_MAPPING_KEY: &str = "default";

/// Ordered keyword -> folder mapping.
///
/// Serialized as a JSON object. Entries keep document order, which is the
/// order keywords are tried in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMappings(Vec<(String, String)>);

impl FolderMappings {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace a mapping, keeping the position of an existing keyword
    pub fn insert(&mut self, keyword: impl Into<String>, folder: impl Into<String>) {
        let keyword = keyword.into();
        let folder = folder.into();
        match self.0.iter_mut().find(|(k, _)| *k == keyword) {
            Some(entry) => entry.1 = folder,
            None => self.0.push((keyword, folder)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, keyword: impl Into<String>, folder: impl Into<String>) -> Self {
        self.insert(keyword, folder);
        self
    }

    /// Look up the folder for an exact keyword
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_str())
    }

    /// The folder registered under the `default` key, if any
    pub fn fallback(&self) -> Option<&str> {
        self.get(DEFAULT_MAPPING_KEY)
    }

    /// Keyword entries in match order, excluding the `default` key
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k != DEFAULT_MAPPING_KEY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries, including `default`
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FolderMappings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (keyword, folder) in &self.0 {
            map.serialize_entry(keyword, folder)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FolderMappings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingsVisitor;

        impl<'de> Visitor<'de> for MappingsVisitor {
            type Value = FolderMappings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping keywords to folder names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mappings = FolderMappings::new();
                while let Some((keyword, folder)) = access.next_entry::<String, String>()? {
                    mappings.insert(keyword, folder);
                }
                Ok(mappings)
            }
        }

        deserializer.deserialize_map(MappingsVisitor)
    }
}

/// `sync_rules` section: what gets synced and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncRulesSection {
    /// Update notes that already exist instead of skipping them
    pub auto_update: bool,
    /// Copy an existing note before overwriting it
    pub backup_before_update: bool,
    /// Largest file that will be synced
    pub max_file_size_mb: f64,
    /// Source file encoding
    pub encoding: String,
    /// Glob-like filename patterns that are never synced
    pub excluded_patterns: Vec<String>,
    /// Path keyword -> Notes folder
    pub folder_mappings: FolderMappings,
    /// Use the first `# heading` as the note title
    pub extract_title_from_content: bool,
}

impl Default for SyncRulesSection {
    fn default() -> Self {
        Self {
            auto_update: true,
            backup_before_update: false,
            max_file_size_mb: 50.0,
            encoding: "utf-8".to_string(),
            excluded_patterns: vec![
                "*.tmp.md".to_string(),
                "*draft*".to_string(),
                ".*".to_string(),
                "_*".to_string(),
            ],
            folder_mappings: FolderMappings::new()
                .with("work", "Work Notes")
                .with("personal", "Personal Notes")
                .with("tech", "Tech Docs")
                .with("claude", "Claude Docs")
                .with(DEFAULT_MAPPING_KEY, "Notes"),
            extract_title_from_content: false,
        }
    }
}

/// `notes_config` section: how notes are named and where they live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesSection {
    /// Notes account to write into
    pub account: String,
    /// Folder used when nothing else matches
    pub default_folder: String,
    pub title_prefix: String,
    pub title_suffix: String,
    /// Append `_YYYYmmdd_HHMMSS` to generated titles
    pub add_timestamp: bool,
    /// Append a footer with the source path to note bodies
    pub add_source_path: bool,
    /// Top-level folder for project-aware sync
    pub project_root_folder: String,
    /// Convert Markdown to the Notes display format in project-aware sync
    pub convert_markdown: bool,
    /// Hard ceiling for a single automation call
    pub script_timeout_secs: u64,
}

impl Default for NotesSection {
    fn default() -> Self {
        Self {
            account: "iCloud".to_string(),
            default_folder: "Notes".to_string(),
            title_prefix: String::new(),
            title_suffix: String::new(),
            add_timestamp: false,
            add_source_path: true,
            project_root_folder: "Claude".to_string(),
            convert_markdown: true,
            script_timeout_secs: 30,
        }
    }
}

/// `logging` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL
    pub level: String,
    /// Plain-text log file; `null` disables file logging
    pub log_file: Option<PathBuf>,
    pub max_log_size_mb: u64,
    pub backup_count: u32,
    /// Mirror log events to stderr
    pub console_output: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_file: Some(PathBuf::from("logs/sync.log")),
            max_log_size_mb: 10,
            backup_count: 5,
            console_output: true,
        }
    }
}

impl LoggingSection {
    /// Parsed log level, if valid
    pub fn log_level(&self) -> Option<LogLevel> {
        LogLevel::parse(&self.level)
    }
}

/// Log levels accepted in the `logging.level` option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Names accepted in configuration files
    pub const NAMES: [&'static str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

    /// Parse a configured level name (exact, upper-case)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The whole configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub sync_rules: SyncRulesSection,
    pub notes_config: NotesSection,
    pub logging: LoggingSection,
    /// Set by the engine for a dry run; never persisted when false
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Copy of this configuration with the dry-run flag set
    pub fn with_dry_run(&self, dry_run: bool) -> Self {
        let mut config = self.clone();
        config.dry_run = dry_run;
        config
    }
}
