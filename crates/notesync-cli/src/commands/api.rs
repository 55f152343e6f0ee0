//! Api command implementations
//!
//! Every api command produces one response object with a `status` of
//! `success` or `error`. In JSON format the object is printed as a single
//! line on stdout; in text format a short summary is printed instead. An
//! error response makes the process exit with status 1.

use std::path::Path;

use colored::Colorize;
use notesync_core::{FileVerdict, SyncEngine};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::cli::{Editor, OutputFormat};
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run `api sync`
pub fn run_api_sync(context: &Context, file: &Path, format: OutputFormat) -> Result<()> {
    emit(&sync_response(context, file), format)
}

/// Run `api status`
pub fn run_api_status(context: &Context, format: OutputFormat) -> Result<()> {
    let response = status_response(context);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&response)?),
        OutputFormat::Text => {
            let flag = |ok: bool, good: &str, bad: &str| {
                if ok {
                    good.green().to_string()
                } else {
                    bad.red().to_string()
                }
            };
            println!("{}", "Status".bold());
            println!("{}:   {}", "Version".dimmed(), response["version"].as_str().unwrap_or("?"));
            println!(
                "{}:    {}",
                "Config".dimmed(),
                flag(response["config_valid"] == true, "valid", "invalid")
            );
            println!(
                "{}:     {}",
                "Notes".dimmed(),
                flag(response["notes_accessible"] == true, "accessible", "unavailable")
            );
        }
    }
    Ok(())
}

/// Run `api config`
pub fn run_api_config(
    context: &Context,
    editor: Option<Editor>,
    get: Option<&str>,
    set: Option<(&str, &str)>,
    format: OutputFormat,
) -> Result<()> {
    emit(&config_response(context, editor, get, set), format)
}

fn sync_response(context: &Context, file: &Path) -> Value {
    if !file.exists() {
        return error(format!("File not found: {}", file.display()));
    }

    let engine = match context.engine(SyncEngine::default_rules()) {
        Ok(engine) => engine,
        Err(e) => return error(e.to_string()),
    };
    let stats = engine.sync_file(file);
    let Some(record) = stats.records.first() else {
        return error("Sync produced no result");
    };
    debug!(file = %file.display(), verdict = %record.verdict, "Api sync finished");

    let message = match record.verdict {
        FileVerdict::Synced if context.dry_run => "Dry run complete".to_string(),
        FileVerdict::Synced => "Sync complete".to_string(),
        FileVerdict::Skipped | FileVerdict::Ignored => format!(
            "Skipped: {}",
            record.message.as_deref().unwrap_or("no applicable rule")
        ),
        FileVerdict::Failed => {
            return error(format!(
                "Sync failed: {}",
                record.failure_reason().unwrap_or("unknown error")
            ));
        }
    };

    let actions: Vec<&str> = record.planned_actions().collect();
    json!({
        "status": "success",
        "message": message,
        "file": file.display().to_string(),
        "verdict": record.verdict,
        "actions": actions,
    })
}

fn status_response(context: &Context) -> Value {
    let issues = context.store.validate();
    let notes_info = context
        .engine(SyncEngine::default_rules())
        .and_then(|engine| engine.notes_info().map_err(CliError::from));

    let (notes_accessible, notes_info) = match notes_info {
        Ok(info) => (true, serde_json::to_value(info).unwrap_or(Value::Null)),
        Err(e) => {
            debug!(error = %e, "Notes not accessible");
            (false, Value::Null)
        }
    };

    json!({
        "status": "success",
        "version": env!("CARGO_PKG_VERSION"),
        "config_valid": issues.is_empty(),
        "config_issues": issues,
        "notes_accessible": notes_accessible,
        "notes_info": notes_info,
    })
}

fn config_response(
    context: &Context,
    editor: Option<Editor>,
    get: Option<&str>,
    set: Option<(&str, &str)>,
) -> Value {
    let store = &context.store;
    let document = match store.load_value() {
        Ok(document) => document,
        Err(e) => return error(e.to_string()),
    };

    let scoped = |key: &str| match editor {
        Some(editor) => format!("editors.{}.{}", editor.config_key(), key),
        None => key.to_string(),
    };

    if let Some(key) = get {
        let key = scoped(key);
        return match store.get(&key) {
            Ok(value) => json!({"status": "success", "key": key, "value": value}),
            Err(e) => error(e.to_string()),
        };
    }

    if let Some((key, raw)) = set {
        let key = scoped(key);
        let value = parse_value(raw);
        return match store.set(&key, value.clone()) {
            Ok(()) => json!({
                "status": "success",
                "message": "Configuration saved",
                "key": key,
                "value": value,
            }),
            Err(e) => error(format!("Failed to save configuration: {}", e)),
        };
    }

    let config = match editor {
        Some(editor) => document
            .get("editors")
            .and_then(|editors| editors.get(editor.config_key()))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        None => document,
    };
    json!({"status": "success", "config": config})
}

/// Values are taken as JSON when they parse, otherwise as plain strings
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn error(message: impl Into<String>) -> Value {
    json!({"status": "error", "message": message.into()})
}

/// Print a response and turn an error status into a failed exit
fn emit(response: &Value, format: OutputFormat) -> Result<()> {
    let ok = response["status"] == "success";

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(response)?),
        OutputFormat::Text if ok => {
            if let (Some(key), Some(value)) = (response.get("key"), response.get("value")) {
                println!("{} {} = {}", "OK".green().bold(), display(key), display(value));
            } else if let Some(message) = response.get("message") {
                println!("{} {}", "OK".green().bold(), display(message));
            } else {
                println!("{} Configuration:", "OK".green().bold());
                println!("{}", serde_json::to_string_pretty(&response["config"])?);
            }
        }
        OutputFormat::Text => {
            println!("{}: {}", "error".red().bold(), display(&response["message"]));
        }
    }

    if ok { Ok(()) } else { Err(CliError::Reported) }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> Context {
        Context::load(Some(temp.path().join("config.json")), true)
    }

    #[test]
    fn parse_value_prefers_json() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("[\"a\"]"), json!(["a"]));
        assert_eq!(parse_value("Work Notes"), json!("Work Notes"));
    }

    #[test]
    fn config_response_requires_document() {
        let temp = TempDir::new().unwrap();
        let response = config_response(&context(&temp), None, Some("logging"), None);
        assert_eq!(response["status"], "error");
    }

    #[test]
    fn config_set_then_get_scoped_to_editor() {
        let temp = TempDir::new().unwrap();
        let context = context(&temp);
        context.store.init(false).unwrap();

        let set = config_response(&context, Some(Editor::Cursor), None, Some(("auto_sync", "true")));
        assert_eq!(set["status"], "success");
        assert_eq!(set["key"], "editors.cursor.auto_sync");

        let get = config_response(&context, Some(Editor::Cursor), Some("auto_sync"), None);
        assert_eq!(get["value"], json!(true));

        let section = config_response(&context, Some(Editor::Cursor), None, None);
        assert_eq!(section["config"], json!({"auto_sync": true}));
    }

    #[test]
    fn config_get_dotted_key() {
        let temp = TempDir::new().unwrap();
        let context = context(&temp);
        context.store.init(false).unwrap();

        let response = config_response(&context, None, Some("notes_config.account"), None);

        assert_eq!(response["value"], "iCloud");
    }

    #[test]
    fn sync_response_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let response = sync_response(&context(&temp), &temp.path().join("gone.md"));

        assert_eq!(response["status"], "error");
        assert!(response["message"].as_str().unwrap().contains("gone.md"));
    }

    #[test]
    fn emit_error_is_reported_failure() {
        let result = emit(&error("boom"), OutputFormat::Json);
        assert!(matches!(result, Err(CliError::Reported)));
    }
}
