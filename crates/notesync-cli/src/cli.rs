//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// notesync - Sync Markdown files into macOS Notes
#[derive(Parser, Debug)]
#[command(name = "notesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show what would be synced without touching Notes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Sync a single Markdown file
    ///
    /// Examples:
    ///   notesync sync-file notes/plan.md
    ///   notesync sync-file plan.md --mode create-only
    ///   notesync --dry-run sync-file plan.md
    SyncFile {
        /// Markdown file to sync
        file: PathBuf,

        #[command(flatten)]
        options: SyncOptions,
    },

    /// Sync every Markdown file in a folder
    SyncFolder {
        /// Folder to scan for .md files
        folder: PathBuf,

        /// Include subfolders
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        options: SyncOptions,
    },

    /// Sync several files, from arguments and/or a list file
    SyncFiles {
        /// Markdown files to sync
        files: Vec<PathBuf>,

        /// Text file with one path per line
        #[arg(short = 'l', long = "file-list", value_name = "FILE")]
        file_list: Option<PathBuf>,

        #[command(flatten)]
        options: SyncOptions,
    },

    /// Show Notes folders and the active rules
    Info,

    /// Show, validate or create the configuration file
    Config {
        /// Print the configuration document
        #[arg(long, conflicts_with_all = ["validate", "init"])]
        show: bool,

        /// Check the configuration for problems
        #[arg(long, conflicts_with = "init")]
        validate: bool,

        /// Write the default configuration
        #[arg(long)]
        init: bool,

        /// Overwrite an existing configuration with --init
        #[arg(long, requires = "init")]
        force: bool,
    },

    /// Machine-friendly commands for editor integrations
    Api {
        #[command(subcommand)]
        action: ApiCommand,
    },
}

/// Options shared by the sync commands
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// How notes are written
    #[arg(long, value_enum, default_value_t = SyncMode::Project)]
    pub mode: SyncMode,

    /// Only sync files modified today
    #[arg(long)]
    pub only_today: bool,

    /// Only sync files created today
    #[arg(long)]
    pub only_created_today: bool,

    /// Only sync files modified within the last HOURS hours
    #[arg(long, value_name = "HOURS")]
    pub modified_since: Option<u32>,

    /// Skip files larger than MB megabytes
    #[arg(long, value_name = "MB")]
    pub max_size: Option<f64>,

    /// Only sync files whose content matches this pattern (repeatable)
    #[arg(long, value_name = "REGEX")]
    pub require: Vec<String>,

    /// Skip files whose content matches this pattern (repeatable)
    #[arg(long, value_name = "REGEX")]
    pub exclude: Vec<String>,
}

/// Which effect rule writes the notes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// One folder per detected project under the project root folder
    Project,
    /// Update an existing note or create it
    Update,
    /// Create notes that do not exist yet, never update
    CreateOnly,
    /// Always create a new note, even if one with the same title exists
    ForceCreate,
}

/// Output format of the api commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Editors with their own configuration section
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    ClaudeCode,
    Cursor,
    Vscode,
}

impl Editor {
    /// Key of this editor's section under `editors`
    pub fn config_key(self) -> &'static str {
        match self {
            Editor::ClaudeCode => "claude_code",
            Editor::Cursor => "cursor",
            Editor::Vscode => "vscode",
        }
    }
}

/// Api subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ApiCommand {
    /// Sync one file and report a single status line or JSON object
    Sync {
        /// File to sync
        #[arg(long)]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Suppress log output
        #[arg(long)]
        quiet: bool,
    },

    /// Report configuration validity and Notes accessibility
    Status {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Read or write configuration values
    Config {
        /// Scope the key to an editor section
        #[arg(long, value_enum)]
        editor: Option<Editor>,

        /// Dotted key to read, e.g. notes_config.account
        #[arg(long, value_name = "KEY", conflicts_with = "set")]
        get: Option<String>,

        /// Dotted key and value to write; the value is parsed as JSON when possible
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Commands {
    /// Whether console logging should stay quiet for this command
    pub fn wants_quiet_logs(&self) -> bool {
        match self {
            Commands::Api { action } => match action {
                ApiCommand::Sync { format, quiet, .. } => *quiet || *format == OutputFormat::Json,
                ApiCommand::Status { format } | ApiCommand::Config { format, .. } => {
                    *format == OutputFormat::Json
                }
            },
            _ => false,
        }
    }
}
