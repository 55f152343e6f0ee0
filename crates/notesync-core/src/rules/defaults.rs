//! Default title, content and folder derivations and shared file checks

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use encoding_rs::Encoding;
use tracing::{error, warn};

use crate::config::{NotesSection, SyncConfig};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Why a source file could not be read as text
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("file is not valid {encoding}")]
    Encoding { encoding: &'static str },
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Read a source file as text in the named encoding (`utf-8`, `gbk`, ...).
///
/// Labels follow the WHATWG Encoding Standard. Malformed input is an error,
/// never replaced.
pub fn read_text(file: &Path, encoding: &str) -> Result<String, ReadError> {
    let codec = Encoding::for_label_no_replacement(encoding.trim().as_bytes())
        .ok_or_else(|| ReadError::UnknownEncoding(encoding.to_string()))?;
    let bytes = fs::read(file)?;
    codec
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(Cow::into_owned)
        .ok_or(ReadError::Encoding {
            encoding: codec.name(),
        })
}

/// File name without its extension
pub fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lower-cased file name
pub fn file_name_lower(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Apply the configured title prefix and suffix
pub fn with_title_affixes(title: &str, notes: &NotesSection) -> String {
    format!("{}{}{}", notes.title_prefix, title, notes.title_suffix)
}

/// Title from the file stem, with prefix, suffix and optional timestamp
pub fn title(file: &Path, config: &SyncConfig) -> String {
    title_at(file, config, Local::now())
}

/// [`title`] with an explicit clock
pub fn title_at(file: &Path, config: &SyncConfig, now: DateTime<Local>) -> String {
    let notes = &config.notes_config;
    let title = with_title_affixes(&file_stem(file), notes);
    if notes.add_timestamp {
        format!("{}_{}", title, now.format("%Y%m%d_%H%M%S"))
    } else {
        title
    }
}

/// Footer appended to note bodies when `add_source_path` is on
pub fn source_footer(file: &Path) -> String {
    format!("\n\n---\n📁 Source: {}", file.display())
}

/// Placeholder body for a file that could not be read.
///
/// The problem is surfaced in the note itself rather than failing the sync.
pub fn unreadable_body(file: &Path, err: &ReadError) -> String {
    match err {
        ReadError::Encoding { .. } | ReadError::UnknownEncoding(_) => format!(
            "❌ File encoding error, could not read content\nFile: {}",
            file.display()
        ),
        ReadError::Io(e) => format!("❌ Failed to read file: {}\nFile: {}", e, file.display()),
    }
}

/// Raw file text, optionally followed by the source footer
pub fn content(file: &Path, config: &SyncConfig) -> String {
    match read_text(file, &config.sync_rules.encoding) {
        Ok(mut text) => {
            if config.notes_config.add_source_path {
                text.push_str(&source_footer(file));
            }
            text
        }
        Err(e) => {
            error!(file = %file.display(), error = %e, "Failed to read file");
            unreadable_body(file, &e)
        }
    }
}

/// Folder from `folder_mappings`.
///
/// Keywords are tried in document order as case-insensitive substrings of
/// the whole path; the `default` entry, then `default_folder`, is the
/// fallback.
pub fn folder(file: &Path, config: &SyncConfig) -> String {
    let mappings = &config.sync_rules.folder_mappings;
    let path = file.to_string_lossy().to_lowercase();

    mappings
        .keywords()
        .find(|(keyword, _)| path.contains(&keyword.to_lowercase()))
        .map(|(_, folder)| folder)
        .or_else(|| mappings.fallback())
        .unwrap_or(config.notes_config.default_folder.as_str())
        .to_string()
}

/// Match a lower-cased file name against one exclusion pattern.
///
/// `*x*` matches a substring, `*x` a suffix, `x*` a prefix; anything else
/// must match exactly. Matching is case-insensitive.
pub fn matches_exclusion(file_name: &str, pattern: &str) -> bool {
    let name = file_name.to_lowercase();
    let pattern = pattern.to_lowercase();

    let leading = pattern.starts_with('*');
    let trailing = pattern.len() > 1 && pattern.ends_with('*');
    match (leading, trailing) {
        (true, true) => name.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => name.ends_with(&pattern[1..]),
        (false, true) => name.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => name == pattern,
    }
}

/// Whether the file name matches any `excluded_patterns` entry
pub fn should_ignore(file: &Path, config: &SyncConfig) -> bool {
    let name = file_name_lower(file);
    config
        .sync_rules
        .excluded_patterns
        .iter()
        .any(|pattern| matches_exclusion(&name, pattern))
}

/// File size in megabytes
pub fn file_size_mb(file: &Path) -> io::Result<f64> {
    Ok(fs::metadata(file)?.len() as f64 / BYTES_PER_MB)
}

/// Whether the file is within `max_file_size_mb`; unreadable metadata fails
pub fn check_size(file: &Path, config: &SyncConfig) -> bool {
    let max_mb = config.sync_rules.max_file_size_mb;
    match file_size_mb(file) {
        Ok(size_mb) if size_mb > max_mb => {
            warn!(
                file = %file.display(),
                size_mb,
                max_mb,
                "File exceeds size limit"
            );
            false
        }
        Ok(_) => true,
        Err(e) => {
            error!(file = %file.display(), error = %e, "Failed to check file size");
            false
        }
    }
}
