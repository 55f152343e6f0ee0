//! Tests for rule composition through the engine

use std::sync::Arc;
use std::time::Duration;

use notesync_core::bridge::{BridgeOp, MemoryBridge};
use notesync_core::rules::{
    Backup, ContentFilter, CreateNew, FolderMapping, HeaderExtractor, Metadata, NoteLayout,
    RuleSet, SizeLimit, TimeRule, TitlePrefix, UpdateExisting, sanitize_project_name,
};
use notesync_core::sync::{FileVerdict, SyncEngine};
use notesync_core::SyncConfig;
use notesync_test_utils::NotesFixture;
use pretty_assertions::assert_eq;

fn config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.notes_config.add_source_path = false;
    config
}

fn run(rules: RuleSet, config: SyncConfig, bridge: Arc<MemoryBridge>) -> SyncEngine {
    SyncEngine::with_rules(config, Box::new(bridge), rules)
}

#[test]
fn test_sanitize_project_name_examples() {
    assert_eq!(sanitize_project_name("My Project!! v2.0"), "My_Project_v2.0");
    assert_eq!(sanitize_project_name("?!*"), "Unknown");
}

#[test]
fn test_layout_combines_derivation_rules() {
    // Title from the heading, folder from the built-in routes, body with metadata
    let fixture = NotesFixture::new();
    let file = fixture.write_file(
        "meeting/weekly.md",
        "---\nattendees: 4\n---\n# Weekly Sync\nAgenda",
    );
    let mut config = config();
    config.sync_rules.extract_title_from_content = true;

    let layout = NoteLayout::new()
        .with_title(HeaderExtractor::new())
        .with_content(Metadata::new())
        .with_folder(FolderMapping::new());
    let bridge = Arc::new(MemoryBridge::new());
    let engine = run(
        RuleSet::new().with_rule(UpdateExisting::new().with_layout(layout)),
        config,
        bridge.clone(),
    );

    let stats = engine.sync_file(&file);

    assert_eq!(stats.success_count, 1);
    let body = bridge.note_body("Weekly Sync", "Meetings").unwrap();
    assert!(body.starts_with("## 📋 Metadata\n**attendees**: 4\n\n# Weekly Sync"));
}

#[test]
fn test_inactive_derivation_falls_back_to_defaults() {
    // Header extraction is off in config, so the file stem is the title
    let fixture = NotesFixture::new();
    let file = fixture.write_file("plan.md", "# Something Else");
    let layout = NoteLayout::new().with_title(HeaderExtractor::new());
    let bridge = Arc::new(MemoryBridge::new());
    let mut config = config();
    config.sync_rules.folder_mappings = Default::default();
    let engine = run(
        RuleSet::new().with_rule(CreateNew::new().with_layout(layout)),
        config,
        bridge.clone(),
    );

    engine.sync_file(&file);

    assert!(bridge.note_body("plan", "Notes").is_some());
}

#[test]
fn test_title_prefix_in_layout() {
    let fixture = NotesFixture::new();
    let file = fixture.write_file("todo/list.md", "- milk");
    let mut config = config();
    config.sync_rules.folder_mappings = Default::default();
    let bridge = Arc::new(MemoryBridge::new());
    let engine = run(
        RuleSet::new().with_rule(
            UpdateExisting::new().with_layout(NoteLayout::new().with_title(TitlePrefix::new())),
        ),
        config,
        bridge.clone(),
    );

    engine.sync_file(&file);

    assert!(bridge.note_body("✅ list", "Notes").is_some());
}

#[test]
fn test_content_and_size_filters_gate_sync() {
    let fixture = NotesFixture::new();
    let keep = fixture.write_file("keep.md", "status: publish\nlong enough body");
    let wip = fixture.write_file("wip.md", "status: wip\nlong enough body");
    let tiny = fixture.write_file("tiny.md", "publish");

    let rules = RuleSet::new()
        .with_rule(ContentFilter::new(&["publish"], &["status: wip"]).unwrap())
        .with_rule(SizeLimit::new(None))
        .with_rule(UpdateExisting::new());
    let bridge = Arc::new(MemoryBridge::new());
    let engine = run(rules, config(), bridge.clone());

    let stats = engine.sync_files([&keep, &wip, &tiny]);

    let verdicts: Vec<FileVerdict> = stats.records.iter().map(|r| r.verdict).collect();
    assert_eq!(
        verdicts,
        vec![FileVerdict::Synced, FileVerdict::Skipped, FileVerdict::Skipped]
    );
    assert_eq!(
        stats.records[2].message.as_deref(),
        Some("filtered by size-limit")
    );
    assert_eq!(bridge.call_count(BridgeOp::CreateNote), 1);
}

#[test]
fn test_time_filter_vetoes_recently_modified_files() {
    let fixture = NotesFixture::new();
    let settled = fixture.write_file("settled.md", "done");
    let fresh = fixture.write_file("fresh.md", "still editing");
    fixture.age_file("settled.md", Duration::from_secs(600));

    let rules = RuleSet::new()
        .with_rule(TimeRule::not_modified_recently(5))
        .with_rule(UpdateExisting::new());
    let engine = run(rules, config(), Arc::new(MemoryBridge::new()));

    let stats = engine.sync_files([&settled, &fresh]);

    assert_eq!(stats.records[0].verdict, FileVerdict::Synced);
    assert_eq!(stats.records[1].verdict, FileVerdict::Skipped);
}

#[test]
fn test_time_gate_syncs_only_recent_files() {
    let fixture = NotesFixture::new();
    let recent = fixture.write_file("recent.md", "new");
    let old = fixture.write_file("old.md", "old");
    fixture.age_file("old.md", Duration::from_secs(3 * 24 * 3600));

    let bridge = Arc::new(MemoryBridge::new());
    let engine = run(
        RuleSet::new().with_rule(TimeRule::modified_since(24)),
        config(),
        bridge.clone(),
    );

    let stats = engine.sync_files([&recent, &old]);

    assert_eq!(stats.records[0].verdict, FileVerdict::Synced);
    assert_eq!(stats.records[1].verdict, FileVerdict::Skipped);
    assert_eq!(bridge.call_count(BridgeOp::CreateNote), 1);
}

#[test]
fn test_backup_runs_before_update() {
    let fixture = NotesFixture::new();
    let file = fixture.write_file("Foo.md", "new body");
    let mut config = config();
    config.sync_rules.folder_mappings = Default::default();
    config.sync_rules.backup_before_update = true;

    let bridge = Arc::new(MemoryBridge::new().with_note("Foo", "Notes", "old body"));
    let engine = run(
        RuleSet::new()
            .with_rule(UpdateExisting::new())
            .with_rule(Backup::new()),
        config,
        bridge.clone(),
    );

    let stats = engine.sync_file(&file);

    let order: Vec<&str> = stats.records[0].rules.iter().map(|r| r.rule.as_str()).collect();
    assert_eq!(order, vec!["backup", "update-existing"]);
    assert_eq!(bridge.note_body("Foo", "Notes").as_deref(), Some("new body"));
    let backup = bridge
        .notes()
        .into_iter()
        .find(|n| n.title.starts_with("Foo_backup_"))
        .unwrap();
    assert_eq!(backup.body, "old body");
}
