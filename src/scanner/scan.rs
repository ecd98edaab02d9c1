//! Walk + hash pipeline producing the record inventory.
//!
//! Files are discovered sequentially by [`Walker`], then hashed on a bounded
//! rayon pool. The returned records are sorted by path, so the inventory
//! does not depend on the order in which hashing threads finish.
//!
//! # Example
//!
//! ```no_run
//! use tunedupe::scanner::{ScanConfig, Scanner, WalkerConfig};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanConfig::new(WalkerConfig::default()).with_io_threads(8));
//! let outcome = scanner.scan(Path::new("/music")).unwrap();
//! println!("{} files hashed, {} skipped", outcome.records.len(), outcome.stats.skipped);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::{FileEntry, FileRecord, HashError, Hasher, ScanError, Walker, WalkerConfig};
use crate::progress::ProgressCallback;

/// Configuration for a scan.
#[derive(Clone)]
pub struct ScanConfig {
    /// Walk filters and quarantine exclusion.
    pub walker: WalkerConfig,
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("walker", &self.walker)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(WalkerConfig::default())
    }
}

impl ScanConfig {
    /// Create a configuration around walker settings.
    #[must_use]
    pub fn new(walker: WalkerConfig) -> Self {
        Self {
            walker,
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the number of hashing threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Counters accumulated by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Eligible regular files discovered by the walk
    pub scanned: usize,
    /// Entries that could not be read (walk or hash failures)
    pub skipped: usize,
    /// Total bytes hashed
    pub bytes_hashed: u64,
    /// Whether the scan stopped early on shutdown
    pub interrupted: bool,
}

/// Records plus the counters describing how they were obtained.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Hashed files, sorted by path
    pub records: Vec<FileRecord>,
    /// Scan counters
    pub stats: ScanStats,
}

/// Scans a library root into hashed [`FileRecord`]s.
#[derive(Debug, Default)]
pub struct Scanner {
    config: ScanConfig,
    hasher: Hasher,
}

impl Scanner {
    /// Create a scanner.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Walk `root` and hash every eligible file.
    ///
    /// # Errors
    ///
    /// Fails only if `root` does not exist or is not a directory. Per-file
    /// problems are logged and counted in [`ScanStats::skipped`].
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome, ScanError> {
        if !root.exists() {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut stats = ScanStats::default();
        let entries = self.discover(root, &mut stats);

        if self.config.is_shutdown_requested() {
            stats.interrupted = true;
            return Ok(ScanOutcome {
                records: Vec::new(),
                stats,
            });
        }

        let records = self.hash_entries(entries, &mut stats);
        Ok(ScanOutcome { records, stats })
    }

    /// Phase 1: sequential walk.
    fn discover(&self, root: &Path, stats: &mut ScanStats) -> Vec<FileEntry> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut walker = Walker::new(root, self.config.walker.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut entries = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(entry) => {
                    stats.scanned += 1;
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(stats.scanned, &entry.path.to_string_lossy());
                    }
                    entries.push(entry);
                }
                Err(e) => {
                    log::debug!("Skipped during walk: {}", e);
                    stats.skipped += 1;
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }
        log::info!("Found {} eligible files under {}", entries.len(), root.display());
        entries
    }

    /// Phase 2: parallel hashing on a bounded pool.
    fn hash_entries(&self, entries: Vec<FileEntry>, stats: &mut ScanStats) -> Vec<FileRecord> {
        if entries.is_empty() {
            return Vec::new();
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", entries.len());
        }
        log::info!(
            "Hashing {} files on {} threads",
            entries.len(),
            self.config.io_threads
        );

        let processed = AtomicUsize::new(0);
        let hash_one = |entry: FileEntry| -> Option<Result<(FileRecord, u64), HashError>> {
            if self.config.is_shutdown_requested() {
                return None;
            }
            let result = self
                .hasher
                .full_hash(&entry.path)
                .map(|hash| (FileRecord::new(entry.path.clone(), hash), entry.size));
            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(done, &entry.path.to_string_lossy());
            }
            Some(result)
        };

        let results: Vec<Option<Result<(FileRecord, u64), HashError>>> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.io_threads)
                .build()
            {
                Ok(pool) => pool.install(|| entries.into_par_iter().map(hash_one).collect()),
                Err(e) => {
                    log::warn!("Failed to create hashing pool ({e}), using global pool");
                    entries.into_par_iter().map(hash_one).collect()
                }
            };

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Some(Ok((record, size))) => {
                    stats.bytes_hashed += size;
                    records.push(record);
                }
                Some(Err(e)) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    stats.skipped += 1;
                }
                None => stats.interrupted = true,
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }

        records.sort();
        records
    }
}
