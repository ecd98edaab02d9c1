//! Pipeline orchestration for one run.
//!
//! # Overview
//!
//! The engine validates its inputs before touching the library, then runs
//! one of three modes:
//!
//! - [`Mode::InventoryEmit`]: scan and print `PATH<TAB>HASH` per file.
//! - [`Mode::DryRun`]: scan (or read an inventory), group, resolve and
//!   classify every move without changing the filesystem.
//! - [`Mode::Execute`]: same as dry-run, but perform the moves.
//!
//! Groups are handled one at a time in hash order. A group is always
//! finished (every candidate handled) before the limit is checked. The
//! shutdown flag is checked between moves; the summary is printed even when
//! the run stops early.
//!
//! # Example
//!
//! ```no_run
//! use tunedupe::engine::{Engine, EngineConfig, Mode};
//! use tunedupe::report::SummaryFormat;
//! use std::path::Path;
//!
//! let config = EngineConfig::new(Path::new("/music"), Path::new("/music/DUPES"), Mode::DryRun)
//!     .with_limit(Some(10));
//! let summary = Engine::new(config)
//!     .run(std::io::stdout().lock(), SummaryFormat::Text)
//!     .unwrap();
//! println!("{} groups", summary.groups);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use crate::actions::{MoveMode, Mover};
use crate::duplicates::{group_by_hash, resolve};
use crate::inventory::{read_records, ColumnOrder};
use crate::progress::ProgressCallback;
use crate::report::{Reporter, RunSummary, SummaryFormat};
use crate::scanner::{FileFilter, FileRecord, ScanConfig, ScanError, Scanner, WalkerConfig};

/// Operating mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Print the hash inventory and stop
    InventoryEmit,
    /// Report what would be moved
    DryRun,
    /// Move duplicates into quarantine
    Execute,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::InventoryEmit => write!(f, "inventory-emit"),
            Mode::DryRun => write!(f, "dry-run"),
            Mode::Execute => write!(f, "execute"),
        }
    }
}

/// Where pre-computed records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    /// A `HASH<TAB>PATH` file
    File(PathBuf),
    /// `HASH<TAB>PATH` lines on standard input
    Stdin,
}

impl InventorySource {
    /// `-` means stdin, anything else a file path.
    #[must_use]
    pub fn from_arg(arg: &Path) -> Self {
        if arg == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }
}

/// Everything one run needs.
#[derive(Clone)]
pub struct EngineConfig {
    /// Library root
    pub root: PathBuf,
    /// Quarantine root
    pub quarantine: PathBuf,
    /// Operating mode
    pub mode: Mode,
    /// Extension allow-list
    pub filter: FileFilter,
    /// Process at most this many groups
    pub limit: Option<usize>,
    /// Hashing threads
    pub io_threads: usize,
    /// Read records instead of scanning
    pub inventory: Option<InventorySource>,
    /// Shared Ctrl+C flag
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Scan progress display
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("root", &self.root)
            .field("quarantine", &self.quarantine)
            .field("mode", &self.mode)
            .field("filter", &self.filter)
            .field("limit", &self.limit)
            .field("io_threads", &self.io_threads)
            .field("inventory", &self.inventory)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl EngineConfig {
    /// Configuration with default filter, no limit and 4 hashing threads.
    #[must_use]
    pub fn new(root: &Path, quarantine: &Path, mode: Mode) -> Self {
        Self {
            root: root.to_path_buf(),
            quarantine: quarantine.to_path_buf(),
            mode,
            filter: FileFilter::default(),
            limit: None,
            io_threads: 4,
            inventory: None,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_inventory(mut self, source: Option<InventorySource>) -> Self {
        self.inventory = source;
        self
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scan root does not exist.
    #[error("scan root not found: {0}")]
    RootNotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("scan root is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    /// Quarantine would swallow the library.
    #[error("quarantine {quarantine} must not be the scan root {root} or contain it")]
    QuarantineContainsRoot { quarantine: PathBuf, root: PathBuf },

    /// Nothing could ever be scanned.
    #[error("extension allow-list is empty")]
    EmptyExtensions,

    /// `inventory-emit` produces an inventory; it cannot consume one.
    #[error("--inventory cannot be combined with inventory-emit mode")]
    InventoryWithEmit,

    /// Scan failed as a whole.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The inventory input could not be read.
    #[error("cannot read inventory {path}: {source}")]
    Inventory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the outcome stream failed.
    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

impl EngineError {
    /// True for errors caused by bad inputs rather than runtime failures.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound(_)
                | Self::RootNotADirectory(_)
                | Self::QuarantineContainsRoot { .. }
                | Self::EmptyExtensions
                | Self::InventoryWithEmit
        )
    }
}

/// Runs the pipeline for one [`EngineConfig`].
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Check inputs and return the resolved `(root, quarantine)` pair.
    ///
    /// Both paths are made absolute with symlinks resolved as far as they
    /// exist, so prefix comparisons between them are meaningful.
    ///
    /// # Errors
    ///
    /// Any configuration problem, before the filesystem is scanned.
    pub fn validate(&self) -> Result<(PathBuf, PathBuf), EngineError> {
        let config = &self.config;

        if config.filter.is_empty() {
            return Err(EngineError::EmptyExtensions);
        }
        if config.mode == Mode::InventoryEmit && config.inventory.is_some() {
            return Err(EngineError::InventoryWithEmit);
        }

        let root = config.root.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::RootNotFound(config.root.clone()),
            _ => EngineError::Scan(ScanError::Io {
                path: config.root.clone(),
                source: e,
            }),
        })?;
        if !root.is_dir() {
            return Err(EngineError::RootNotADirectory(config.root.clone()));
        }

        let quarantine = resolve_path(&config.quarantine).map_err(|e| {
            EngineError::Scan(ScanError::Io {
                path: config.quarantine.clone(),
                source: e,
            })
        })?;
        if root.starts_with(&quarantine) {
            return Err(EngineError::QuarantineContainsRoot { quarantine, root });
        }

        Ok((root, quarantine))
    }

    /// Run the pipeline, writing the outcome stream to `out`.
    ///
    /// # Errors
    ///
    /// Configuration errors, a failed scan of the root itself, an unreadable
    /// inventory, or a failed write to `out`. Per-file problems are counted
    /// in the summary instead.
    pub fn run<W: Write>(&self, out: W, format: SummaryFormat) -> Result<RunSummary, EngineError> {
        let (root, quarantine) = self.validate()?;
        let mode = self.config.mode;
        log::info!(
            "Mode {} on {} (quarantine {})",
            mode,
            root.display(),
            quarantine.display()
        );

        let mut summary = RunSummary::new(mode);
        let mut reporter = Reporter::new(out, format);

        let records = match self.config.inventory {
            Some(ref source) => self.read_inventory(source, &root, &quarantine, &mut summary)?,
            None => self.scan(&root, &quarantine, &mut summary)?,
        };

        if summary.interrupted {
            log::warn!("Interrupted during scan; nothing was moved");
            self.finish(&mut reporter, &summary)?;
            return Ok(summary);
        }

        match mode {
            Mode::InventoryEmit => reporter.inventory(&records)?,
            Mode::DryRun | Mode::Execute => {
                let move_mode = if mode == Mode::Execute {
                    MoveMode::Execute
                } else {
                    MoveMode::DryRun
                };
                let mover = Mover::new(&root, &quarantine, move_mode);
                self.process_groups(records, &mover, &mut reporter, &mut summary)?;
            }
        }

        self.finish(&mut reporter, &summary)?;
        Ok(summary)
    }

    /// `inventory-emit` stdout carries records only; its summary goes to the log.
    fn finish<W: Write>(
        &self,
        reporter: &mut Reporter<W>,
        summary: &RunSummary,
    ) -> Result<(), EngineError> {
        if self.config.mode != Mode::InventoryEmit {
            reporter.summary(summary)?;
        }
        log::info!("{}", summary.to_line());
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn scan(
        &self,
        root: &Path,
        quarantine: &Path,
        summary: &mut RunSummary,
    ) -> Result<Vec<FileRecord>, EngineError> {
        let walker = WalkerConfig::new(self.config.filter.clone()).with_quarantine(quarantine);
        let mut scan_config = ScanConfig::new(walker).with_io_threads(self.config.io_threads);
        if let Some(ref flag) = self.config.shutdown_flag {
            scan_config = scan_config.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            scan_config = scan_config.with_progress_callback(Arc::clone(callback));
        }

        let outcome = Scanner::new(scan_config).scan(root)?;
        log::info!(
            "Hashed {} files ({} bytes), {} skipped",
            outcome.records.len(),
            outcome.stats.bytes_hashed,
            outcome.stats.skipped
        );
        summary.scanned += outcome.stats.scanned;
        summary.skipped += outcome.stats.skipped;
        summary.interrupted |= outcome.stats.interrupted;
        Ok(outcome.records)
    }

    fn read_inventory(
        &self,
        source: &InventorySource,
        root: &Path,
        quarantine: &Path,
        summary: &mut RunSummary,
    ) -> Result<Vec<FileRecord>, EngineError> {
        let (records, stats) = match source {
            InventorySource::Stdin => {
                read_records(io::stdin().lock(), ColumnOrder::Either).map_err(|e| {
                    EngineError::Inventory {
                        path: PathBuf::from("-"),
                        source: e,
                    }
                })?
            }
            InventorySource::File(path) => {
                let inventory_error = |e| EngineError::Inventory {
                    path: path.clone(),
                    source: e,
                };
                let file = File::open(path).map_err(inventory_error)?;
                read_records(BufReader::new(file), ColumnOrder::Either)
                    .map_err(inventory_error)?
            }
        };
        summary.rejected += stats.rejected;

        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            match admit_inventory_path(&record.path, root, quarantine, &self.config.filter) {
                Ok(path) => kept.push(FileRecord::new(path, record.hash)),
                Err(reason) => {
                    log::debug!("Inventory record skipped ({}): {}", reason, record.path.display());
                    summary.skipped += 1;
                }
            }
        }
        summary.scanned += kept.len();
        Ok(kept)
    }

    fn process_groups<W: Write>(
        &self,
        records: Vec<FileRecord>,
        mover: &Mover,
        reporter: &mut Reporter<W>,
        summary: &mut RunSummary,
    ) -> Result<(), EngineError> {
        let (groups, stats) = group_by_hash(records);
        let limit = self.config.limit.unwrap_or(usize::MAX);
        if stats.duplicate_groups > limit {
            log::info!(
                "Processing {} of {} duplicate groups",
                limit,
                stats.duplicate_groups
            );
        }

        'groups: for group in groups.iter().take(limit) {
            let resolution = match resolve(group) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("{}", e);
                    continue;
                }
            };

            summary.groups += 1;
            summary.kept += 1;
            reporter.group(group)?;
            reporter.keep(&resolution.keeper)?;

            for candidate in &resolution.candidates {
                if self.is_shutdown_requested() {
                    summary.interrupted = true;
                    log::warn!("Interrupted; stopping before the next move");
                    break 'groups;
                }
                let report = mover.relocate(&candidate.record);
                summary.record(&report);
                reporter.outcome(&report)?;
            }
        }

        Ok(())
    }
}

/// Normalize an inventory path and check it names a file the scan could
/// have produced: absolute, free of `..`, under `root`, outside
/// `quarantine` and eligible for `filter`.
fn admit_inventory_path(
    path: &Path,
    root: &Path,
    quarantine: &Path,
    filter: &FileFilter,
) -> Result<PathBuf, &'static str> {
    if !path.is_absolute() {
        return Err("relative path");
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err("contains '..'");
    }
    let path: PathBuf = path.components().collect();
    if !path.starts_with(root) || path == root {
        return Err("outside the scan root");
    }
    if path.starts_with(quarantine) {
        return Err("inside quarantine");
    }
    if !filter.allows(&path) {
        return Err("not an eligible file");
    }
    Ok(path)
}

/// Absolute form of `path` with symlinks resolved for the part that exists.
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    if let Ok(canonical) = absolute.canonicalize() {
        return Ok(canonical);
    }
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(resolve_path(parent)?.join(name)),
        _ => Ok(absolute),
    }
}
