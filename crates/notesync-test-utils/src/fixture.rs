//! [`NotesFixture`] builder for sync test scenarios.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// A temporary directory of Markdown sources, project markers and an
/// optional `config.json`.
///
/// # Example
///
/// ```rust
/// use notesync_test_utils::NotesFixture;
///
/// let fixture = NotesFixture::new();
/// fixture.project("My Game", &[".git"]);
/// let note = fixture.write_file("My Game/docs/plan.md", "# Plan");
/// assert!(note.exists());
/// ```
pub struct NotesFixture {
    temp_dir: TempDir,
}

impl Default for NotesFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl NotesFixture {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the fixture.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Create a project directory holding the given markers.
    ///
    /// Markers with an extension (`package.json`) become files, the rest
    /// (`.git`, `Assets`) directories.
    pub fn project(&self, name: &str, markers: &[&str]) -> PathBuf {
        let dir = self.path(name);
        fs::create_dir_all(&dir).unwrap();
        for marker in markers {
            let path = dir.join(marker);
            if Path::new(marker).extension().is_some() {
                fs::write(&path, "").unwrap();
            } else {
                fs::create_dir_all(&path).unwrap();
            }
        }
        dir
    }

    /// Write `config.json` at the fixture root.
    pub fn write_config(&self, json: &str) -> PathBuf {
        self.write_file("config.json", json)
    }

    /// Set the modification time of a fixture file.
    pub fn set_mtime(&self, relative: &str, time: SystemTime) {
        let file = File::options()
            .write(true)
            .open(self.path(relative))
            .unwrap_or_else(|e| panic!("Could not open {}: {}", relative, e));
        file.set_modified(time).unwrap();
    }

    /// Make a fixture file look untouched for `age`.
    pub fn age_file(&self, relative: &str, age: Duration) {
        self.set_mtime(relative, SystemTime::now() - age);
    }
}
