//! Conflict-safe relocation of duplicates into quarantine.
//!
//! # Overview
//!
//! Every move candidate is relocated to the same relative path under the
//! quarantine root that it had under the scan root. The mover never renames
//! a file and never overwrites an existing path:
//!
//! 1. A source already under quarantine is a conflict and is left alone.
//! 2. The destination mirrors the source's path relative to the scan root.
//! 3. An existing destination (of any type) is a conflict.
//! 4. In execute mode the destination name is reserved with an exclusive
//!    create, then the source is renamed over the reservation. Across
//!    filesystems the bytes are copied into the reservation, synced and
//!    re-hashed; the source is only removed once the copy verifies.
//!
//! Dry-run performs steps 1-3 with read-only checks and never touches the
//! filesystem, so its report predicts what execute would do.
//!
//! # Example
//!
//! ```no_run
//! use tunedupe::actions::relocate::{MoveMode, Mover};
//! use tunedupe::scanner::{ContentHash, FileRecord};
//! use std::path::{Path, PathBuf};
//!
//! let mover = Mover::new(Path::new("/music"), Path::new("/music/DUPES"), MoveMode::DryRun);
//! let record = FileRecord::new(PathBuf::from("/music/b/song copy.mp3"), ContentHash::of_bytes(b""));
//! let report = mover.relocate(&record);
//! println!("{:?}", report.outcome);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::{ContentHash, FileRecord, HashError, Hasher};

/// Whether the mover touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Classify only
    DryRun,
    /// Perform the moves
    Execute,
}

/// Why a candidate was not moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The source already lives under the quarantine root.
    AlreadyQuarantined,
    /// Something already occupies the destination path.
    DestinationExists,
}

/// Result of handling one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at the destination.
    Moved,
    /// Dry-run: the move would have gone ahead.
    WouldMove,
    /// Left in place on purpose.
    Conflict(ConflictReason),
    /// Left in place because something went wrong.
    Failed(String),
}

/// One outcome record, as printed by the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// Candidate path
    pub source: PathBuf,
    /// Mirrored path under quarantine, when it could be computed
    pub destination: Option<PathBuf>,
    /// What happened
    pub outcome: MoveOutcome,
}

impl MoveReport {
    fn new(source: &Path, destination: Option<PathBuf>, outcome: MoveOutcome) -> Self {
        Self {
            source: source.to_path_buf(),
            destination,
            outcome,
        }
    }

    /// True for `Failed` outcomes.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Failed(_))
    }
}

/// Error type for relocation steps.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The source does not lie under the scan root, so no mirror path exists.
    #[error("{path} is outside the scan root {root}")]
    OutsideScanRoot { path: PathBuf, root: PathBuf },

    /// The destination was taken between the check and the reservation.
    #[error("destination exists: {0}")]
    DestinationExists(PathBuf),

    /// The copied bytes did not hash to the recorded value.
    #[error("verification failed for {path}: expected {expected}, got {actual}")]
    VerifyMismatch {
        path: PathBuf,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Re-hashing the copy failed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// General I/O error.
    #[error("{op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocateError {
    fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::OutsideScanRoot { path: p, .. }
            | Self::DestinationExists(p)
            | Self::VerifyMismatch { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::Hash(HashError::NotFound(p) | HashError::PermissionDenied(p))
            | Self::Hash(HashError::Io { path: p, .. }) => Some(p),
        }
    }
}

/// Relocates move candidates from the scan root into quarantine.
#[derive(Debug, Clone)]
pub struct Mover {
    scan_root: PathBuf,
    quarantine_root: PathBuf,
    mode: MoveMode,
    hasher: Hasher,
}

impl Mover {
    /// Create a mover for one run.
    #[must_use]
    pub fn new(scan_root: &Path, quarantine_root: &Path, mode: MoveMode) -> Self {
        Self {
            scan_root: scan_root.to_path_buf(),
            quarantine_root: quarantine_root.to_path_buf(),
            mode,
            hasher: Hasher::new(),
        }
    }

    /// The mode this mover runs in.
    #[must_use]
    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    /// Mirrored destination of `source` under the quarantine root.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::OutsideScanRoot`] when `source` does not lie
    /// under the scan root.
    pub fn destination_for(&self, source: &Path) -> Result<PathBuf, RelocateError> {
        let relative =
            source
                .strip_prefix(&self.scan_root)
                .map_err(|_| RelocateError::OutsideScanRoot {
                    path: source.to_path_buf(),
                    root: self.scan_root.clone(),
                })?;
        Ok(self.quarantine_root.join(relative))
    }

    /// Handle one candidate. Never panics and never returns early: every
    /// failure becomes a [`MoveOutcome::Failed`] report.
    pub fn relocate(&self, record: &FileRecord) -> MoveReport {
        let source = record.path.as_path();

        if source.starts_with(&self.quarantine_root) {
            log::debug!("Already in quarantine: {}", source.display());
            return MoveReport::new(
                source,
                None,
                MoveOutcome::Conflict(ConflictReason::AlreadyQuarantined),
            );
        }

        let destination = match self.destination_for(source) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("{}", e);
                return MoveReport::new(source, None, MoveOutcome::Failed(e.to_string()));
            }
        };

        match fs::symlink_metadata(&destination) {
            Ok(_) => {
                log::debug!("Destination exists: {}", destination.display());
                return MoveReport::new(
                    source,
                    Some(destination),
                    MoveOutcome::Conflict(ConflictReason::DestinationExists),
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = RelocateError::io("stat", &destination, e);
                log::warn!("{}", err);
                return MoveReport::new(
                    source,
                    Some(destination),
                    MoveOutcome::Failed(err.to_string()),
                );
            }
        }

        if self.mode == MoveMode::DryRun {
            return MoveReport::new(source, Some(destination), MoveOutcome::WouldMove);
        }

        let outcome = match self.execute(source, &destination, record.hash) {
            Ok(()) => {
                log::info!(
                    "Moved {} -> {}",
                    source.display(),
                    destination.display()
                );
                MoveOutcome::Moved
            }
            Err(RelocateError::DestinationExists(_)) => {
                log::debug!("Lost reservation race: {}", destination.display());
                MoveOutcome::Conflict(ConflictReason::DestinationExists)
            }
            Err(e) => {
                log::error!("Move failed for {}: {}", source.display(), e);
                MoveOutcome::Failed(e.to_string())
            }
        };
        MoveReport::new(source, Some(destination), outcome)
    }

    fn execute(
        &self,
        source: &Path,
        destination: &Path,
        expected: ContentHash,
    ) -> Result<(), RelocateError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| RelocateError::io("create_dir", parent, e))?;
        }

        let reservation = reserve(destination)?;

        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                log::debug!(
                    "Rename crosses devices, copying {} -> {}",
                    source.display(),
                    destination.display()
                );
                self.copy_verified(source, destination, reservation, expected)
            }
            Err(e) => {
                drop(reservation);
                release(destination);
                Err(RelocateError::io("rename", source, e))
            }
        }
    }

    /// Copy `source` into the reserved `destination`, verify the copy
    /// against `expected`, then remove the source. On any error the
    /// destination is removed again and the source is left as it was.
    fn copy_verified(
        &self,
        source: &Path,
        destination: &Path,
        mut reservation: File,
        expected: ContentHash,
    ) -> Result<(), RelocateError> {
        let result = (|| {
            let mut input =
                File::open(source).map_err(|e| RelocateError::io("open", source, e))?;
            io::copy(&mut input, &mut reservation)
                .map_err(|e| RelocateError::io("copy", destination, e))?;
            reservation
                .sync_all()
                .map_err(|e| RelocateError::io("sync", destination, e))?;
            drop(reservation);

            let actual = self.hasher.full_hash(destination)?;
            if actual != expected {
                return Err(RelocateError::VerifyMismatch {
                    path: destination.to_path_buf(),
                    expected,
                    actual,
                });
            }

            fs::remove_file(source).map_err(|e| RelocateError::io("remove", source, e))
        })();

        if result.is_err() {
            release(destination);
        }
        result
    }
}

fn reserve(destination: &Path) -> Result<File, RelocateError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                RelocateError::DestinationExists(destination.to_path_buf())
            } else {
                RelocateError::io("reserve", destination, e)
            }
        })
}

fn release(destination: &Path) {
    if let Err(e) = fs::remove_file(destination) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!(
                "Could not remove reservation {}: {}",
                destination.display(),
                e
            );
        }
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    // EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows
    let raw = if cfg!(windows) { 17 } else { 18 };
    error.kind() == io::ErrorKind::CrossesDevices || error.raw_os_error() == Some(raw)
}
