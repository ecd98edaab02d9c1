//! Outcome stream and end-of-run summary.
//!
//! Everything the engine prints on stdout goes through [`Reporter`]. Lines
//! carry no timestamps or other run-dependent data, so two dry-runs over an
//! unchanged tree produce byte-identical output.
//!
//! # Line formats
//!
//! ```text
//! GROUP <hash> (<n> files)
//! KEEP <path> [score <n>]
//! WOULD MOVE <source> -> <destination>
//! MOVED <source> -> <destination>
//! CONFLICT <source> -> <destination> (destination exists)
//! CONFLICT <source> (already in quarantine)
//! FAILED <source>: <error>
//! SUMMARY mode=<mode> scanned=<n> skipped=<n> rejected=<n> groups=<n> kept=<n> moved=<n> conflicted=<n> failed=<n>
//! ```
//!
//! With [`SummaryFormat::Json`] the final line is replaced by a
//! pretty-printed JSON object.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use crate::actions::{ConflictReason, MoveOutcome, MoveReport};
use crate::duplicates::{DuplicateGroup, ScoredRecord};
use crate::engine::Mode;
use crate::inventory::{write_records, ColumnOrder};
use crate::scanner::FileRecord;

/// How the end-of-run summary is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// One `SUMMARY key=value ...` line
    #[default]
    Text,
    /// Pretty-printed JSON object
    Json,
}

impl std::fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryFormat::Text => write!(f, "text"),
            SummaryFormat::Json => write!(f, "json"),
        }
    }
}

/// Counters for one run.
///
/// Threaded through the engine by value; every stage adds to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Operating mode
    pub mode: Mode,
    /// Files that passed the filters (or inventory records accepted)
    pub scanned: usize,
    /// Files or records dropped: unreadable, vanished, filtered out
    pub skipped: usize,
    /// Malformed inventory lines
    pub rejected: usize,
    /// Duplicate groups processed
    pub groups: usize,
    /// Keepers left in place
    pub kept: usize,
    /// Files moved into quarantine
    pub moved: usize,
    /// Dry-run moves that would have happened
    pub would_move: usize,
    /// Candidates left in place because of a conflict
    pub conflicted: usize,
    /// Candidates left in place because of an error
    pub failed: usize,
    /// Run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    /// Empty summary for a run in `mode`.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            scanned: 0,
            skipped: 0,
            rejected: 0,
            groups: 0,
            kept: 0,
            moved: 0,
            would_move: 0,
            conflicted: 0,
            failed: 0,
            interrupted: false,
        }
    }

    /// Count one move outcome.
    pub fn record(&mut self, report: &MoveReport) {
        match report.outcome {
            MoveOutcome::Moved => self.moved += 1,
            MoveOutcome::WouldMove => self.would_move += 1,
            MoveOutcome::Conflict(_) => self.conflicted += 1,
            MoveOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// The `moved=` column: real moves, or would-moves in dry-run.
    #[must_use]
    pub fn moved_column(&self) -> usize {
        match self.mode {
            Mode::DryRun => self.would_move,
            Mode::InventoryEmit | Mode::Execute => self.moved,
        }
    }

    /// True when at least one move failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// The single `SUMMARY` line (without newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "SUMMARY mode={} scanned={} skipped={} rejected={} groups={} kept={} moved={} conflicted={} failed={}",
            self.mode,
            self.scanned,
            self.skipped,
            self.rejected,
            self.groups,
            self.kept,
            self.moved_column(),
            self.conflicted,
            self.failed
        )
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `GROUP <hash> (<n> files)`
#[must_use]
pub fn group_line(group: &DuplicateGroup) -> String {
    format!("GROUP {} ({} files)", group.hash, group.len())
}

/// `KEEP <path> [score <n>]`
#[must_use]
pub fn keep_line(keeper: &ScoredRecord) -> String {
    format!(
        "KEEP {} [score {}]",
        keeper.record.path.display(),
        keeper.score
    )
}

/// One outcome line for a move report.
#[must_use]
pub fn move_line(report: &MoveReport) -> String {
    let source = report.source.display();
    match (&report.outcome, &report.destination) {
        (MoveOutcome::Moved, Some(dest)) => format!("MOVED {} -> {}", source, dest.display()),
        (MoveOutcome::WouldMove, Some(dest)) => {
            format!("WOULD MOVE {} -> {}", source, dest.display())
        }
        (MoveOutcome::Conflict(ConflictReason::DestinationExists), Some(dest)) => {
            format!("CONFLICT {} -> {} (destination exists)", source, dest.display())
        }
        (MoveOutcome::Conflict(ConflictReason::DestinationExists), None) => {
            format!("CONFLICT {} (destination exists)", source)
        }
        (MoveOutcome::Conflict(ConflictReason::AlreadyQuarantined), _) => {
            format!("CONFLICT {} (already in quarantine)", source)
        }
        (MoveOutcome::Failed(error), _) => format!("FAILED {}: {}", source, error),
        (MoveOutcome::Moved | MoveOutcome::WouldMove, None) => {
            format!("FAILED {}: no destination", source)
        }
    }
}

/// Writes the outcome stream to any [`Write`] sink.
pub struct Reporter<W: Write> {
    out: W,
    format: SummaryFormat,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing to `out`.
    pub fn new(out: W, format: SummaryFormat) -> Self {
        Self { out, format }
    }

    /// Emit inventory lines (`PATH<TAB>HASH`), path bytes verbatim.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn inventory(&mut self, records: &[FileRecord]) -> io::Result<()> {
        write_records(&mut self.out, records, ColumnOrder::PathFirst)
    }

    /// Emit the header of a group.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn group(&mut self, group: &DuplicateGroup) -> io::Result<()> {
        writeln!(self.out, "{}", group_line(group))
    }

    /// Emit the keeper of the current group.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn keep(&mut self, keeper: &ScoredRecord) -> io::Result<()> {
        writeln!(self.out, "{}", keep_line(keeper))
    }

    /// Emit one move outcome.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn outcome(&mut self, report: &MoveReport) -> io::Result<()> {
        writeln!(self.out, "{}", move_line(report))
    }

    /// Emit the summary in the configured format and flush.
    ///
    /// # Errors
    ///
    /// Propagates write and serialization errors.
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        match self.format {
            SummaryFormat::Text => writeln!(self.out, "{}", summary.to_line())?,
            SummaryFormat::Json => {
                let json = summary.to_json_pretty().map_err(io::Error::other)?;
                writeln!(self.out, "{}", json)?;
            }
        }
        self.out.flush()
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
