//! Error types for notesync-core

use std::path::PathBuf;

/// Result type for notesync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file exists but refuses to be overwritten
    #[error("Configuration already exists at {path} (use --force to overwrite)")]
    ConfigExists { path: PathBuf },

    /// A dotted configuration key could not be resolved
    #[error("Configuration key not found: {key}")]
    ConfigKeyNotFound { key: String },

    /// Configuration document has the wrong shape
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Source file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Folder to sync does not exist
    #[error("Folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    /// Path exists but is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A rule could not complete for a reason outside its expected failure modes
    #[error("Rule '{rule}' failed: {message}")]
    RuleFailed { rule: String, message: String },

    /// Error reported by the Notes bridge
    #[error(transparent)]
    Bridge(#[from] crate::bridge::BridgeError),

    /// Invalid regular expression in a content filter
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Invalid glob pattern while discovering files
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
