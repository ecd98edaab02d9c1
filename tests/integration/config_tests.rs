use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tunedupe::config::{Config, ConfigError};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all TUNEDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("TUNEDUPE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.quarantine_dir_name, "DUPES");
    assert_eq!(config.io_threads, 4);
    assert!(config.extensions.contains(&"flac".to_string()));
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(
        &config_path,
        r#"
extensions = ["mp3", "opus"]
quarantine_dir_name = "_dupes"
io_threads = 2
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.extensions, vec!["mp3", "opus"]);
    assert_eq!(config.quarantine_dir_name, "_dupes");
    assert_eq!(config.io_threads, 2);
    assert!(config.filter().allows_name("a.OPUS"));
    assert!(!config.filter().allows_name("a.flac"));
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 16\n").unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.io_threads, 16);
    assert_eq!(config.quarantine_dir_name, "DUPES");
}

#[test]
fn test_config_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 2\n").unwrap();

    std::env::set_var("TUNEDUPE_IO_THREADS", "12");
    std::env::set_var("TUNEDUPE_QUARANTINE_DIR_NAME", "Q");
    let config = Config::load(Some(&config_path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 12);
    assert_eq!(config.quarantine_dir_name, "Q");
}

#[test]
fn test_config_env_extension_list() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    std::env::set_var("TUNEDUPE_EXTENSIONS", "[wav, aiff]");
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("TUNEDUPE_").split("__"));
    let config: Result<Config, _> = figment.extract();
    clear_env();

    assert_eq!(config.unwrap().extensions, vec!["wav", "aiff"]);
}

#[test]
fn test_config_invalid_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = [not toml").unwrap();

    assert!(matches!(
        Config::load(Some(&config_path)),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_config_wrong_type() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = \"many\"\n").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_zero_threads_invalid() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 0\n").unwrap();

    assert!(matches!(
        Config::load(Some(&config_path)),
        Err(ConfigError::InvalidIoThreads)
    ));
}

#[test]
fn test_config_roundtrips_through_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let config = Config {
        io_threads: 3,
        ..Config::default()
    };
    fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();
    assert_eq!(loaded, config);
}
