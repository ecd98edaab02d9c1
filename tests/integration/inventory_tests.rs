use tunedupe::engine::{Engine, EngineConfig, InventorySource, Mode};
use tunedupe::inventory::{read_records, write_records, ColumnOrder};
use tunedupe::report::SummaryFormat;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_emitted_inventory_drives_dry_run() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap().join("root");
    let quarantine = root.join("DUPES");
    write(&root, "a/song.mp3", b"audio");
    write(&root, "b/song (1).mp3", b"audio");

    // inventory-emit prints PATH<TAB>HASH
    let mut emitted = Vec::new();
    Engine::new(EngineConfig::new(&root, &quarantine, Mode::InventoryEmit))
        .run(&mut emitted, SummaryFormat::Text)
        .unwrap();
    let (records, stats) = read_records(emitted.as_slice(), ColumnOrder::PathFirst).unwrap();
    assert_eq!(stats.rejected, 0);
    assert_eq!(records.len(), 2);

    // grouping consumes HASH<TAB>PATH
    let inventory = dir.path().join("inventory.tsv");
    write_records(fs::File::create(&inventory).unwrap(), &records, ColumnOrder::HashFirst).unwrap();

    let from_inventory = EngineConfig::new(&root, &quarantine, Mode::DryRun)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(from_inventory)
        .run(&mut out, SummaryFormat::Text)
        .unwrap();

    let mut scanned_out = Vec::new();
    Engine::new(EngineConfig::new(&root, &quarantine, Mode::DryRun))
        .run(&mut scanned_out, SummaryFormat::Text)
        .unwrap();

    assert_eq!(summary.would_move, 1);
    assert_eq!(out, scanned_out);
}

#[test]
fn test_malformed_inventory_lines_counted() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap().join("root");
    fs::create_dir_all(&root).unwrap();
    let inventory = dir.path().join("bad.tsv");
    fs::write(
        &inventory,
        "nonsense\nABCDEF\t/root/a.mp3\n0000000000000000000000000000000000000000000000000000000000000000\t\n",
    )
    .unwrap();

    let config = EngineConfig::new(&root, &root.join("DUPES"), Mode::DryRun)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.rejected, 3);
    assert_eq!(summary.scanned, 0);
    assert_eq!(summary.groups, 0);
}

#[test]
fn test_emitted_inventory_reads_back_unchanged() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap().join("root");
    let quarantine = root.join("DUPES");
    write(&root, "a/song.mp3", b"audio");
    write(&root, "b/song copy.mp3", b"audio");

    let emitted = dir.path().join("paths.tsv");
    Engine::new(EngineConfig::new(&root, &quarantine, Mode::InventoryEmit))
        .run(fs::File::create(&emitted).unwrap(), SummaryFormat::Text)
        .unwrap();

    let config = EngineConfig::new(&root, &quarantine, Mode::DryRun)
        .with_inventory(Some(InventorySource::File(emitted)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.would_move, 1);
}

#[test]
fn test_inventory_paths_outside_root_are_skipped() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let root = base.join("root");
    write(&root, "a/song.mp3", b"audio");
    write(&base, "other/song.mp3", b"audio");

    let hash = tunedupe::scanner::ContentHash::of_bytes(b"audio");
    let inventory = base.join("inv.tsv");
    fs::write(
        &inventory,
        format!(
            "{hash}\t{}\n{hash}\t{}\n",
            root.join("../other/song.mp3").display(),
            root.join("a/song.mp3").display(),
        ),
    )
    .unwrap();

    let config = EngineConfig::new(&root, &root.join("DUPES"), Mode::Execute)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.groups, 0);
    assert_eq!(summary.skipped, 1);
    assert!(root.join("a/song.mp3").exists());
    assert!(base.join("other/song.mp3").exists());
}

#[test]
fn test_quarantine_copy_in_inventory_cannot_become_keeper() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let root = base.join("r");
    let quarantine = root.join("DUPES");
    write(&quarantine, "a/song.mp3", b"audio");
    write(&root, "b/song copy.mp3", b"audio");

    let hash = tunedupe::scanner::ContentHash::of_bytes(b"audio");
    let inventory = base.join("inv.tsv");
    fs::write(
        &inventory,
        format!(
            "{hash}\t{}\n{hash}\t{}\n",
            quarantine.join("a/song.mp3").display(),
            root.join("b/song copy.mp3").display(),
        ),
    )
    .unwrap();

    let config = EngineConfig::new(&root, &quarantine, Mode::Execute)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.moved, 0);
    assert_eq!(summary.skipped, 1);
    assert!(root.join("b/song copy.mp3").exists());
    assert!(!quarantine.join("b/song copy.mp3").exists());
}

#[test]
fn test_same_file_spelled_twice_keeps_library_copy() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let root = base.join("r");
    let quarantine = root.join("DUPES");
    write(&root, "a/song.mp3", b"audio");
    fs::create_dir_all(root.join("b")).unwrap();

    let hash = tunedupe::scanner::ContentHash::of_bytes(b"audio");
    let inventory = base.join("inv.tsv");
    fs::write(
        &inventory,
        format!(
            "{hash}\t{}\n{hash}\t{}\n{hash}\t{}\n",
            root.join("a/song.mp3").display(),
            root.join("b/../a/song.mp3").display(),
            root.join("./a/song.mp3").display(),
        ),
    )
    .unwrap();

    let config = EngineConfig::new(&root, &quarantine, Mode::Execute)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.groups, 0);
    assert_eq!(summary.moved, 0);
    assert!(root.join("a/song.mp3").exists());
    assert!(!quarantine.exists());
}

#[test]
fn test_non_utf8_inventory_line_does_not_abort_run() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap().join("root");
    write(&root, "a/song.mp3", b"audio");
    write(&root, "b/song (1).mp3", b"audio");

    let hash = tunedupe::scanner::ContentHash::of_bytes(b"audio");
    let mut data = format!(
        "{hash}\t{}\n{hash}\t{}\n",
        root.join("a/song.mp3").display(),
        root.join("b/song (1).mp3").display(),
    )
    .into_bytes();
    data.extend_from_slice(b"\xff\xfe\n");
    let inventory = dir.path().join("inv.tsv");
    fs::write(&inventory, data).unwrap();

    let config = EngineConfig::new(&root, &root.join("DUPES"), Mode::DryRun)
        .with_inventory(Some(InventorySource::File(inventory)));
    let mut out = Vec::new();
    let summary = Engine::new(config).run(&mut out, SummaryFormat::Text).unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.would_move, 1);
}
