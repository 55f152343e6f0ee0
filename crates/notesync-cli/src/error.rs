//! Error types for notesync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from notesync-core
    #[error(transparent)]
    Core(#[from] notesync_core::Error),

    /// Error from the Notes bridge
    #[error(transparent)]
    Bridge(#[from] notesync_core::BridgeError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },

    /// The command failed and has already told the user why
    #[error("command failed")]
    Reported,
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Whether main still needs to print this error
    pub fn needs_report(&self) -> bool {
        !matches!(self, Self::Reported)
    }
}
