//! Command-line interface definitions for tunedupe.
//!
//! # Example
//!
//! ```bash
//! # See what would be quarantined
//! tunedupe ~/Music --mode dry-run
//!
//! # Move duplicates into ~/Music/DUPES, first 50 groups only
//! tunedupe ~/Music --mode execute --limit 50
//!
//! # Emit the hash inventory, then resolve from it later
//! tunedupe ~/Music --mode inventory-emit > inventory.tsv
//! awk -F'\t' '{print $2 "\t" $1}' inventory.tsv | tunedupe ~/Music --mode dry-run --inventory -
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::engine::Mode;
use crate::report::SummaryFormat;

/// Find byte-identical duplicates in a music library and move all but the
/// cleanest-named copy into a quarantine directory.
///
/// Files are never renamed and never overwritten.
#[derive(Debug, Parser)]
#[command(name = "tunedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all diagnostics except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Library root to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// What to do with the duplicates found
    #[arg(short, long, value_enum)]
    pub mode: Mode,

    /// Quarantine directory (default: <ROOT>/DUPES)
    #[arg(long, value_name = "DIR")]
    pub quarantine: Option<PathBuf>,

    /// Allowed file extension; repeat to allow several. Replaces the
    /// configured list.
    #[arg(short, long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Process only the first K duplicate groups (in hash order)
    #[arg(long, value_name = "K")]
    pub limit: Option<usize>,

    /// Read HASH<TAB>PATH records from FILE (or - for stdin) instead of scanning
    #[arg(long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Number of I/O threads for hashing
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Summary line format
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub summary_format: SummaryFormat,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}
