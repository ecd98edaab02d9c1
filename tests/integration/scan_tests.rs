use tunedupe::duplicates::group_by_hash;
use tunedupe::scanner::{FileFilter, ScanConfig, Scanner, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

fn scanner_for(quarantine: &Path) -> Scanner {
    Scanner::new(ScanConfig::new(
        WalkerConfig::new(FileFilter::default()).with_quarantine(quarantine),
    ))
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.scanned, 0);
}

#[test]
fn test_identical_content_identical_hash() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/song.mp3", b"identical");
    write(dir.path(), "b/song.flac", b"identical");
    write(dir.path(), "c/other.ogg", b"different");

    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    let (groups, stats) = group_by_hash(outcome.records);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(stats.unique_hashes, 2);
}

#[test]
fn test_junk_and_foreign_files_never_hashed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/song.mp3", b"audio");
    write(dir.path(), "a/.DS_Store", b"audio");
    write(dir.path(), "a/._song.mp3", b"audio");
    write(dir.path(), "a/notes.txt", b"audio");

    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.records[0].path.ends_with("a/song.mp3"));
    assert!(group_by_hash(outcome.records).0.is_empty());
}

#[test]
fn test_quarantine_excluded() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/song.mp3", b"audio");
    write(dir.path(), "DUPES/a/song copy.mp3", b"audio");

    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert!(group_by_hash(outcome.records).0.is_empty());
}

#[test]
fn test_records_sorted_regardless_of_threads() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(dir.path(), &format!("d{}/t{}.mp3", i % 7, i), format!("{}", i % 5).as_bytes());
    }

    let serial = Scanner::new(ScanConfig::default().with_io_threads(1))
        .scan(dir.path())
        .unwrap();
    let parallel = Scanner::new(ScanConfig::default().with_io_threads(8))
        .scan(dir.path())
        .unwrap();

    assert_eq!(serial.records, parallel.records);
    let mut sorted = serial.records.clone();
    sorted.sort();
    assert_eq!(serial.records, sorted);
}

#[test]
fn test_extension_case_insensitive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A.MP3", b"x");
    write(dir.path(), "b.Flac", b"x");

    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();
    assert_eq!(outcome.records.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_counted_as_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "ok.mp3", b"fine");
    write(dir.path(), "locked.mp3", b"secret");
    let locked = dir.path().join("locked.mp3");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // root can read anything; nothing to assert then
    if File::open(&locked).is_ok() {
        return;
    }

    let outcome = scanner_for(&dir.path().join("DUPES"))
        .scan(dir.path())
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.skipped, 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
