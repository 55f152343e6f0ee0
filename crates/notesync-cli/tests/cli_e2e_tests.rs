//! CLI end-to-end tests that invoke the compiled `notesync` binary.
//!
//! Nothing here needs Notes.app: syncs run with `--dry-run`, where lookups
//! that cannot reach Notes are treated as "not there yet".

use assert_cmd::Command;
use notesync_test_utils::NotesFixture;
use predicates::prelude::*;

/// `notesync` running inside the fixture root with plain output
fn notesync(fixture: &NotesFixture) -> Command {
    let mut cmd = Command::cargo_bin("notesync").expect("Failed to find notesync binary");
    cmd.current_dir(fixture.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().last().expect("no output");
    serde_json::from_str(line).expect("output is not JSON")
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync-file"))
        .stdout(predicate::str::contains("sync-folder"))
        .stdout(predicate::str::contains("api"));
}

#[test]
fn test_version_flag() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_command_shows_hint() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("notesync --help"));
}

#[test]
fn test_unknown_mode_is_rejected() {
    let fixture = NotesFixture::new();
    fixture.write_file("plan.md", "# Plan");
    notesync(&fixture)
        .args(["sync-file", "plan.md", "--mode", "sometimes"])
        .assert()
        .failure();
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_init_refuses_to_overwrite() {
    let fixture = NotesFixture::new();

    notesync(&fixture)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration"));
    assert!(fixture.path("config.json").is_file());

    notesync(&fixture)
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    notesync(&fixture)
        .args(["config", "--init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_init_honours_config_path() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["-c", "settings/notesync.json", "config", "--init"])
        .assert()
        .success();

    assert!(fixture.path("settings/notesync.json").is_file());
    assert!(!fixture.path("config.json").exists());
}

#[test]
fn test_config_validate_defaults() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["config", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_validate_reports_issues() {
    let fixture = NotesFixture::new();
    fixture.write_config(
        r#"{
            "sync_rules": {"max_file_size_mb": -1},
            "notes_config": {},
            "logging": {"level": "LOUD", "log_file": null}
        }"#,
    );

    notesync(&fixture)
        .args(["config", "--validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("max_file_size_mb must be a positive number"))
        .stdout(predicate::str::contains("Invalid log level: LOUD"));
}

#[test]
fn test_bad_config_value_is_logged_and_others_kept() {
    let fixture = NotesFixture::new();
    fixture.write_config(
        r#"{
            "sync_rules": {"max_file_size_mb": "big", "folder_mappings": {}},
            "notes_config": {"default_folder": "Inbox"},
            "logging": {"log_file": null}
        }"#,
    );
    fixture.write_file("plan.md", "# Plan");

    notesync(&fixture)
        .args(["--dry-run", "sync-file", "plan.md", "--mode", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create note 'plan' in 'Inbox'"))
        .stderr(predicate::str::contains(
            "Invalid value for sync_rules.max_file_size_mb, using default",
        ));
}

#[test]
fn test_config_show_prints_document() {
    let fixture = NotesFixture::new();
    fixture.write_config(r#"{"notes_config": {"account": "Work"}}"#);

    notesync(&fixture)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"account\": \"Work\""));
}

#[test]
fn test_config_show_missing_file_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["config", "--show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
}

#[test]
fn test_config_without_action_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--show, --validate or --init"));
}

// ============================================================================
// sync (dry run)
// ============================================================================

#[test]
fn test_dry_run_sync_file_plans_note() {
    let fixture = NotesFixture::new();
    fixture.write_file("plan.md", "# Plan\nShip it");

    notesync(&fixture)
        .args(["--dry-run", "sync-file", "plan.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create note 'plan'"))
        .stdout(predicate::str::contains("DRY RUN"));
}

#[test]
fn test_dry_run_update_mode_uses_default_folder() {
    let fixture = NotesFixture::new();
    fixture.write_config(r#"{"sync_rules": {"folder_mappings": {}}, "logging": {"log_file": null}}"#);
    fixture.write_file("plan.md", "# Plan");

    notesync(&fixture)
        .args(["--dry-run", "sync-file", "plan.md", "--mode", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create note 'plan' in 'Notes'"));
}

#[test]
fn test_sync_file_missing_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["--dry-run", "sync-file", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_dry_run_sync_folder_recursive() {
    let fixture = NotesFixture::new();
    fixture.write_file("docs/a.md", "# A");
    fixture.write_file("docs/deep/b.md", "# B");
    fixture.write_file("docs/deep/draft-c.md", "# C");

    notesync(&fixture)
        .args(["--dry-run", "sync-folder", "docs", "-r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 3 file(s) synced"))
        .stdout(predicate::str::contains("matches an excluded pattern"));
}

#[test]
fn test_sync_folder_missing_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["--dry-run", "sync-folder", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Folder not found"));
}

#[test]
fn test_dry_run_sync_files_from_list() {
    let fixture = NotesFixture::new();
    fixture.write_file("a.md", "# A");
    fixture.write_file("b.md", "# B");
    fixture.write_file("list.txt", "# files to sync\na.md\n\nb.md\n");

    notesync(&fixture)
        .args(["--dry-run", "sync-files", "-l", "list.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Syncing 2 file(s)"));
}

#[test]
fn test_sync_files_without_files_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .args(["--dry-run", "sync-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files to sync"));
}

#[test]
fn test_content_filter_skips_file() {
    let fixture = NotesFixture::new();
    fixture.write_file("wip.md", "status: wip\nnot ready yet");

    notesync(&fixture)
        .args(["--dry-run", "sync-file", "wip.md", "--require", "status: ready"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filtered by content-filter"));
}

#[test]
fn test_invalid_require_pattern_fails() {
    let fixture = NotesFixture::new();
    fixture.write_file("a.md", "# A");
    notesync(&fixture)
        .args(["--dry-run", "sync-file", "a.md", "--require", "(unclosed"])
        .assert()
        .failure();
}

// ============================================================================
// info
// ============================================================================

#[test]
fn test_info_lists_rules() {
    let fixture = NotesFixture::new();
    notesync(&fixture)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("auto-sync"))
        .stdout(predicate::str::contains("file-type"));
}

// ============================================================================
// api
// ============================================================================

#[test]
fn test_api_sync_json_dry_run() {
    let fixture = NotesFixture::new();
    fixture.write_file("plan.md", "# Plan");

    let output = notesync(&fixture)
        .args(["--dry-run", "api", "sync", "--file", "plan.md", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    assert_eq!(response["status"], "success");
    assert_eq!(response["verdict"], "synced");
    assert!(
        response["actions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a.as_str().unwrap().contains("Would create note 'plan'"))
    );
}

#[test]
fn test_api_sync_missing_file_json_error() {
    let fixture = NotesFixture::new();

    let output = notesync(&fixture)
        .args(["api", "sync", "--file", "gone.md", "--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let response = stdout_json(&output.stdout);
    assert_eq!(response["status"], "error");
    assert!(response["message"].as_str().unwrap().contains("gone.md"));
}

#[test]
fn test_api_json_keeps_stderr_free_of_logs() {
    let fixture = NotesFixture::new();
    fixture.write_file("plan.md", "# Plan");

    notesync(&fixture)
        .args(["--dry-run", "api", "sync", "--file", "plan.md", "--format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_api_status_json() {
    let fixture = NotesFixture::new();

    let output = notesync(&fixture)
        .args(["api", "status", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let response = stdout_json(&output.stdout);
    assert_eq!(response["status"], "success");
    assert_eq!(response["config_valid"], true);
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_api_config_set_and_get() {
    let fixture = NotesFixture::new();
    notesync(&fixture).args(["config", "--init"]).assert().success();

    notesync(&fixture)
        .args(["api", "config", "--set", "notes_config.account", "Work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes_config.account = Work"));

    let output = notesync(&fixture)
        .args(["api", "config", "--get", "notes_config.account", "--format", "json"])
        .output()
        .unwrap();
    let response = stdout_json(&output.stdout);
    assert_eq!(response["value"], "Work");
}

#[test]
fn test_api_config_editor_section() {
    let fixture = NotesFixture::new();
    notesync(&fixture).args(["config", "--init"]).assert().success();

    notesync(&fixture)
        .args(["api", "config", "--editor", "cursor", "--set", "sync_on_save", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("editors.cursor.sync_on_save = true"));

    // The extra section does not break validation
    notesync(&fixture)
        .args(["config", "--validate"])
        .assert()
        .success();
}

#[test]
fn test_api_config_unknown_key_fails() {
    let fixture = NotesFixture::new();
    notesync(&fixture).args(["config", "--init"]).assert().success();

    notesync(&fixture)
        .args(["api", "config", "--get", "nope.missing"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration key not found: nope.missing"));
}
