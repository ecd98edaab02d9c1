use tunedupe::engine::{Engine, EngineConfig, Mode};
use tunedupe::report::{RunSummary, SummaryFormat};
use tunedupe::scanner::FileFilter;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// /root/{a,b,c} holding one song three times plus some noise.
fn library() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap().join("root");
    write(&root, "a/song.mp3", b"song bytes");
    write(&root, "b/song copy.mp3", b"song bytes");
    write(&root, "c/song (1).mp3", b"song bytes");
    write(&root, "x/track-2.flac", b"track bytes");
    write(&root, "y/track.flac", b"track bytes");
    write(&root, "z/solo.ogg", b"unique");
    write(&root, "a/.DS_Store", b"song bytes");
    write(&root, "a/readme.txt", b"song bytes");
    let quarantine = root.join("DUPES");
    (dir, root, quarantine)
}

fn run_with(config: EngineConfig, format: SummaryFormat) -> (RunSummary, String) {
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, format).unwrap();
    (summary, String::from_utf8(out).unwrap())
}

fn run(root: &Path, quarantine: &Path, mode: Mode) -> (RunSummary, String) {
    run_with(EngineConfig::new(root, quarantine, mode), SummaryFormat::Text)
}

#[test]
fn test_dry_run_twice_is_byte_identical() {
    let (_dir, root, quarantine) = library();
    let (_, first) = run(&root, &quarantine, Mode::DryRun);
    let (_, second) = run(&root, &quarantine, Mode::DryRun);
    assert_eq!(first, second);
    assert!(!quarantine.exists());
}

#[test]
fn test_execute_scenario() {
    let (_dir, root, quarantine) = library();
    let (summary, out) = run(&root, &quarantine, Mode::Execute);

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.kept, 2);
    assert_eq!(summary.moved, 3);
    assert_eq!(summary.conflicted, 0);
    assert_eq!(summary.failed, 0);

    assert!(root.join("a/song.mp3").exists());
    assert!(quarantine.join("b/song copy.mp3").exists());
    assert!(quarantine.join("c/song (1).mp3").exists());
    assert!(root.join("y/track.flac").exists());
    assert!(quarantine.join("x/track-2.flac").exists());

    // junk and foreign files are never touched
    assert!(root.join("a/.DS_Store").exists());
    assert!(root.join("a/readme.txt").exists());
    assert!(!out.contains(".DS_Store"));
    assert!(!out.contains("readme.txt"));

    assert!(out.lines().last().unwrap().starts_with("SUMMARY mode=execute"));
}

#[test]
fn test_rerun_after_execute_finds_no_groups() {
    let (_dir, root, quarantine) = library();
    run(&root, &quarantine, Mode::Execute);

    let (summary, _) = run(&root, &quarantine, Mode::DryRun);
    assert_eq!(summary.groups, 0);
    assert_eq!(summary.would_move, 0);
}

#[test]
fn test_conflict_scenario() {
    let (_dir, root, quarantine) = library();
    write(&quarantine, "b/song copy.mp3", b"already here");

    let (summary, out) = run(&root, &quarantine, Mode::Execute);

    assert_eq!(summary.conflicted, 1);
    assert_eq!(summary.moved, 2);
    assert!(out.contains(&format!(
        "CONFLICT {} -> {} (destination exists)",
        root.join("b/song copy.mp3").display(),
        quarantine.join("b/song copy.mp3").display()
    )));
    assert_eq!(fs::read(root.join("b/song copy.mp3")).unwrap(), b"song bytes");

    // the conflicted copy is still a duplicate on the next run
    let (again, _) = run(&root, &quarantine, Mode::DryRun);
    assert_eq!(again.groups, 1);
    assert_eq!(again.conflicted, 1);
}

#[test]
fn test_existing_quarantine_content_untouched() {
    let (_dir, root, quarantine) = library();
    write(&quarantine, "old/keep.mp3", b"song bytes");
    write(&quarantine, "old/keep copy.mp3", b"song bytes");

    run(&root, &quarantine, Mode::Execute);

    assert_eq!(fs::read(quarantine.join("old/keep.mp3")).unwrap(), b"song bytes");
    assert_eq!(
        fs::read(quarantine.join("old/keep copy.mp3")).unwrap(),
        b"song bytes"
    );
}

#[test]
fn test_limit_processes_whole_groups() {
    let (_dir, root, quarantine) = library();
    let config = EngineConfig::new(&root, &quarantine, Mode::DryRun).with_limit(Some(1));
    let (summary, out) = run_with(config, SummaryFormat::Text);

    assert_eq!(summary.groups, 1);
    assert_eq!(out.lines().filter(|l| l.starts_with("GROUP ")).count(), 1);
    assert_eq!(out.lines().filter(|l| l.starts_with("KEEP ")).count(), 1);

    // whichever group comes first in hash order, all its candidates are handled
    let candidates = out.lines().filter(|l| l.starts_with("WOULD MOVE ")).count();
    assert!(candidates == 1 || candidates == 2);
}

#[test]
fn test_limit_selects_same_groups_every_time() {
    let (_dir, root, quarantine) = library();
    let config = || EngineConfig::new(&root, &quarantine, Mode::DryRun).with_limit(Some(1));
    let (_, a) = run_with(config(), SummaryFormat::Text);
    let (_, b) = run_with(config(), SummaryFormat::Text);
    assert_eq!(a, b);
}

#[test]
fn test_custom_extension_list() {
    let (_dir, root, quarantine) = library();
    let config = EngineConfig::new(&root, &quarantine, Mode::DryRun)
        .with_filter(FileFilter::new(["flac"]));
    let (summary, _) = run_with(config, SummaryFormat::Text);

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.groups, 1);
}

#[test]
fn test_json_summary() {
    let (_dir, root, quarantine) = library();
    let config = EngineConfig::new(&root, &quarantine, Mode::DryRun);
    let (_, out) = run_with(config, SummaryFormat::Json);

    let json_start = out.find('{').unwrap();
    let value: serde_json::Value = serde_json::from_str(&out[json_start..]).unwrap();
    assert_eq!(value["mode"], "dry-run");
    assert_eq!(value["groups"], 2);
    assert_eq!(value["would_move"], 3);
    assert_eq!(value["scanned"], 6);
}

#[test]
fn test_inventory_emit_stdout_holds_records_only() {
    let (_dir, root, quarantine) = library();
    let (summary, out) = run(&root, &quarantine, Mode::InventoryEmit);

    let records: Vec<&str> = out.lines().collect();
    assert_eq!(records.len(), 6);
    for line in records {
        let (path, hash) = line.rsplit_once('\t').unwrap();
        assert!(path.starts_with(&root.display().to_string()));
        assert_eq!(hash.len(), 64);
    }
    assert_eq!(summary.scanned, 6);
}

#[test]
fn test_inventory_emit_json_format_keeps_stdout_clean() {
    let (_dir, root, quarantine) = library();
    let config = EngineConfig::new(&root, &quarantine, Mode::InventoryEmit);
    let (_, out) = run_with(config, SummaryFormat::Json);

    assert!(!out.contains('{'));
    assert_eq!(out.lines().count(), 6);
}
