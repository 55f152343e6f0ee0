//! Notes bridge backed by `osascript`

use std::io::ErrorKind;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use super::script;
use super::{BridgeError, NoteInfo, NotesBridge, Result, folder_segments};
use crate::config::NotesSection;

/// Drives Notes.app by running AppleScript through `osascript`.
///
/// Every call is a blocking subprocess invocation with a hard timeout; a
/// call that runs over is killed and reported as [`BridgeError::Timeout`].
pub struct OsascriptBridge {
    account: String,
    default_folder: String,
    timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for OsascriptBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsascriptBridge")
            .field("account", &self.account)
            .field("default_folder", &self.default_folder)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OsascriptBridge {
    /// Create a bridge for an account.
    ///
    /// Fails only if the internal runtime used for timeouts cannot be built.
    pub fn new(
        account: impl Into<String>,
        default_folder: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            account: account.into(),
            default_folder: default_folder.into(),
            timeout,
            runtime,
        })
    }

    /// Create a bridge from the `notes_config` section
    pub fn from_config(notes: &NotesSection) -> Result<Self> {
        Self::new(
            notes.account.clone(),
            notes.default_folder.clone(),
            Duration::from_secs(notes.script_timeout_secs),
        )
    }

    /// Default folder used when an operation names no folder
    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    fn segments<'a>(&'a self, folder: &'a str) -> Vec<&'a str> {
        let segments = folder_segments(folder);
        if segments.is_empty() {
            folder_segments(&self.default_folder)
        } else {
            segments
        }
    }

    /// Run a script and return its trimmed stdout, whatever it says
    fn run_raw(&self, source: &str) -> Result<String> {
        let mut command = Command::new("osascript");
        command.arg("-e").arg(source).kill_on_drop(true);

        let output = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, command.output()).await });

        let output = match output {
            Err(_) => {
                warn!(seconds = self.timeout.as_secs(), "osascript timed out");
                return Err(BridgeError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(BridgeError::Unavailable {
                    message: format!("osascript not found: {}", e),
                });
            }
            Ok(Err(e)) => return Err(BridgeError::Io(e)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = ?output.status.code(), stderr = %stderr, "osascript failed");
            return Err(BridgeError::ScriptFailed { message: stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a script, treating an `error: ...` answer as a failure
    fn run(&self, source: &str) -> Result<String> {
        let stdout = self.run_raw(source)?;
        match script::error_message(&stdout) {
            Some(message) => Err(BridgeError::ScriptFailed {
                message: message.to_string(),
            }),
            None => Ok(stdout),
        }
    }

    fn expect_success(&self, source: &str) -> Result<()> {
        let stdout = self.run(source)?;
        if stdout.starts_with("success") {
            Ok(())
        } else {
            Err(BridgeError::ScriptFailed {
                message: format!("unexpected script result: {}", stdout),
            })
        }
    }

    fn segment_exists(&self, segments: &[&str]) -> Result<bool> {
        let stdout = self.run(&script::folder_exists(&self.account, segments))?;
        Ok(stdout == "exists")
    }
}

impl NotesBridge for OsascriptBridge {
    fn account(&self) -> &str {
        &self.account
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        let segments = self.segments(folder);
        let stdout = self.run(&script::note_exists(&self.account, &segments, title))?;
        Ok(stdout == "true")
    }

    fn create_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        let segments = self.segments(folder);
        self.expect_success(&script::create_note(&self.account, &segments, title, content))?;
        info!(title, folder = %segments.join("/"), "Created note");
        Ok(())
    }

    fn update_note(&self, title: &str, content: &str, folder: &str) -> Result<()> {
        let segments = self.segments(folder);
        self.expect_success(&script::update_note(&self.account, &segments, title, content))?;
        info!(title, folder = %segments.join("/"), "Updated note");
        Ok(())
    }

    fn delete_note(&self, title: &str, folder: &str) -> Result<()> {
        let segments = self.segments(folder);
        self.expect_success(&script::delete_note(&self.account, &segments, title))?;
        info!(title, folder = %segments.join("/"), "Deleted note");
        Ok(())
    }

    fn get_folders(&self) -> Result<Vec<String>> {
        let stdout = self.run(&script::list_folders(&self.account))?;
        Ok(script::parse_list(&stdout))
    }

    fn get_existing_notes(&self, folder: &str) -> Result<Vec<String>> {
        let segments = self.segments(folder);
        let stdout = self.run(&script::list_notes(&self.account, &segments))?;
        let notes = script::parse_list(&stdout);
        debug!(count = notes.len(), folder = %segments.join("/"), "Listed notes");
        Ok(notes)
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        let segments = folder_segments(path);
        if segments.is_empty() {
            return Err(BridgeError::InvalidFolderPath {
                path: path.to_string(),
            });
        }
        self.segment_exists(&segments)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let segments = folder_segments(path);
        if segments.is_empty() {
            return Err(BridgeError::InvalidFolderPath {
                path: path.to_string(),
            });
        }

        for depth in 1..=segments.len() {
            let current = &segments[..depth];
            if self.segment_exists(current)? {
                continue;
            }
            let (name, parents) = (current[depth - 1], &current[..depth - 1]);
            self.expect_success(&script::make_folder(&self.account, parents, name))?;
            info!(folder = %current.join("/"), "Created folder");
        }
        Ok(())
    }

    fn get_note_info(&self, title: &str, folder: &str) -> Result<Option<NoteInfo>> {
        let segments = self.segments(folder);
        let stdout = self.run_raw(&script::note_info(&self.account, &segments, title))?;
        Ok(script::parse_note_info(title, &stdout))
    }
}
