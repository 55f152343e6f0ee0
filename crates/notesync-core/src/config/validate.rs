//! Validation of raw configuration documents
//!
//! Validation works on the untyped JSON so that every problem can be
//! reported at once instead of stopping at the first deserialization error.

use serde_json::Value;

use super::schema::{LogLevel, SyncConfig};

const REQUIRED_SECTIONS: [&str; 3] = ["sync_rules", "notes_config", "logging"];

/// Validate a configuration document and return human-readable issues.
///
/// An empty list means the document is valid.
pub fn validate_value(value: &Value) -> Vec<String> {
    let mut issues = Vec::new();

    let Some(root) = value.as_object() else {
        issues.push("Configuration root must be a JSON object".to_string());
        return issues;
    };

    for key in REQUIRED_SECTIONS {
        match root.get(key) {
            None => issues.push(format!("Missing config section: {}", key)),
            Some(section) if !section.is_object() => {
                issues.push(format!("Config section {} must be an object", key))
            }
            Some(_) => {}
        }
    }

    if let Some(sync_rules) = root.get("sync_rules").and_then(Value::as_object) {
        if let Some(max_size) = sync_rules.get("max_file_size_mb") {
            match max_size.as_f64() {
                Some(mb) if mb > 0.0 => {}
                _ => issues.push("max_file_size_mb must be a positive number".to_string()),
            }
        }

        if let Some(encoding) = sync_rules.get("encoding") {
            match encoding.as_str() {
                Some(name) if is_supported_encoding(name) => {}
                Some(name) => issues.push(format!("Unsupported encoding: {}", name)),
                None => issues.push("encoding must be a string".to_string()),
            }
        }

        if let Some(patterns) = sync_rules.get("excluded_patterns") {
            let all_strings = patterns
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !all_strings {
                issues.push("excluded_patterns must be a list of strings".to_string());
            }
        }

        if let Some(mappings) = sync_rules.get("folder_mappings") {
            match mappings.as_object() {
                Some(map) => {
                    for (keyword, folder) in map {
                        if !folder.is_string() {
                            issues.push(format!(
                                "folder_mappings.{} must be a folder name string",
                                keyword
                            ));
                        }
                    }
                }
                None => issues.push("folder_mappings must be an object".to_string()),
            }
        }
    }

    let level = root
        .get("logging")
        .and_then(|logging| logging.get("level"))
        .and_then(Value::as_str)
        .unwrap_or("INFO");
    if LogLevel::parse(level).is_none() {
        issues.push(format!(
            "Invalid log level: {}, expected one of {}",
            level,
            LogLevel::NAMES.join(", ")
        ));
    }

    // Catch remaining type mismatches the targeted checks above do not cover
    if issues.is_empty()
        && let Err(e) = serde_json::from_value::<SyncConfig>(value.clone())
    {
        issues.push(format!("Invalid configuration: {}", e));
    }

    issues
}

/// Whether `name` is an encoding label source files can be decoded with
pub fn is_supported_encoding(name: &str) -> bool {
    encoding_rs::Encoding::for_label_no_replacement(name.trim().as_bytes()).is_some()
}
