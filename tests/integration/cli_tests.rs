use clap::Parser;
use tunedupe::cli::Cli;
use tunedupe::error::ExitCode;
use std::fs;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    let mut full = vec!["tunedupe", "-q", "--no-progress"];
    full.extend_from_slice(args);
    Cli::try_parse_from(full).unwrap()
}

#[test]
fn test_run_app_dry_run_succeeds() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.mp3"), b"x").unwrap();
    fs::write(dir.path().join("a copy.mp3"), b"x").unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let root = dir.path().to_str().unwrap();
    let code = tunedupe::run_app(cli(&[
        root,
        "--mode",
        "dry-run",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a copy.mp3").exists());
    assert!(!dir.path().join("DUPES").exists());
}

#[test]
fn test_run_app_missing_root_is_config_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let missing = dir.path().join("missing");

    let err = tunedupe::run_app(cli(&[
        missing.to_str().unwrap(),
        "--mode",
        "dry-run",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_app_quarantine_equal_root_is_config_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let root = dir.path().to_str().unwrap();

    let err = tunedupe::run_app(cli(&[
        root,
        "--mode",
        "execute",
        "--quarantine",
        root,
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_app_inventory_with_emit_is_config_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let err = tunedupe::run_app(cli(&[
        dir.path().to_str().unwrap(),
        "--mode",
        "inventory-emit",
        "--inventory",
        "-",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_app_bad_config_file_is_config_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "io_threads = 0\n").unwrap();

    let err = tunedupe::run_app(cli(&[
        dir.path().to_str().unwrap(),
        "--mode",
        "dry-run",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_ext_flag_replaces_configured_list() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.mp3"), b"x").unwrap();
    fs::write(dir.path().join("b.mp3"), b"x").unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let code = tunedupe::run_app(cli(&[
        dir.path().to_str().unwrap(),
        "--mode",
        "execute",
        "--ext",
        "flac",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a.mp3").exists());
    assert!(dir.path().join("b.mp3").exists());
}
