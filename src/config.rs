//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory
//! 3. Environment variables prefixed `TUNEDUPE_` (e.g. `TUNEDUPE_IO_THREADS=8`,
//!    `TUNEDUPE_EXTENSIONS='[mp3, flac]'`)
//!
//! CLI flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::filter::DEFAULT_EXTENSIONS;
use crate::scanner::FileFilter;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TUNEDUPE_";

/// Default name of the quarantine directory under the scan root.
pub const DEFAULT_QUARANTINE_DIR: &str = "DUPES";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Allowed audio extensions, case-insensitive, without dots.
    pub extensions: Vec<String>,
    /// Quarantine directory name used when `--quarantine` is not given.
    pub quarantine_dir_name: String,
    /// Hashing threads.
    pub io_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            quarantine_dir_name: DEFAULT_QUARANTINE_DIR.to_string(),
            io_threads: 4,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("invalid configuration: {0}")]
    Invalid(#[source] Box<figment::Error>),

    /// `io_threads` must be at least 1.
    #[error("io_threads must be at least 1")]
    InvalidIoThreads,

    /// No usable extension in the allow-list.
    #[error("extension allow-list is empty")]
    EmptyExtensions,

    /// The quarantine name must be a single plain path component.
    #[error("invalid quarantine directory name: '{0}'")]
    InvalidQuarantineName(String),
}

impl Config {
    /// Platform config file location, if a home directory can be found.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tunedupe", "tunedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The layered provider chain, without extraction.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration.
    ///
    /// A missing default file is fine; a missing explicit file is not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable, malformed or invalid settings.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(file) = path {
            if !file.is_file() {
                return Err(ConfigError::NotFound(file.to_path_buf()));
            }
        }
        let config: Config = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))?;
        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidIoThreads);
        }
        if self.filter().is_empty() {
            return Err(ConfigError::EmptyExtensions);
        }
        let name = self.quarantine_dir_name.as_str();
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(std::path::Component::Normal(_)), None)
        );
        if !single_normal || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidQuarantineName(name.to_string()));
        }
        Ok(())
    }

    /// The extension allow-list as a filter.
    #[must_use]
    pub fn filter(&self) -> FileFilter {
        FileFilter::new(&self.extensions)
    }
}
