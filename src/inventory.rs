//! Hash inventory interchange format.
//!
//! An inventory is a newline-delimited list of `(hash, path)` pairs, one per
//! line, separated by a single tab. Two column orders exist:
//!
//! - [`ColumnOrder::HashFirst`]: `HASH<TAB>PATH`, the input of grouping
//! - [`ColumnOrder::PathFirst`]: `PATH<TAB>HASH`, what `inventory-emit` prints
//!
//! The hash is always 64 lowercase hex characters. A hash-first line splits
//! at the first tab and a path-first line at the last, so a path that itself
//! contains a tab still parses. [`ColumnOrder::Either`] accepts both orders
//! line by line, so an emitted inventory can be fed straight back in.
//!
//! Lines are handled as bytes. On Unix a path column is taken verbatim, so
//! file names that are not valid UTF-8 survive a round trip; elsewhere such
//! a column is rejected like any other malformed line.
//!
//! Malformed lines are rejected individually and counted; reading never
//! fails because of bad content, only because of I/O.
//!
//! # Example
//!
//! ```
//! use tunedupe::inventory::{read_records, ColumnOrder};
//!
//! let data = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\t/music/a.mp3\nnot a record\n";
//! let (records, stats) = read_records(data.as_bytes(), ColumnOrder::HashFirst).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(stats.rejected, 1);
//! ```

use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::{ContentHash, FileRecord, ParseHashError};

/// Column order of an inventory line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    /// `HASH<TAB>PATH`
    HashFirst,
    /// `PATH<TAB>HASH`
    PathFirst,
    /// Either order, decided per line; hash-first wins when both columns
    /// parse as a hash. Written as hash-first.
    Either,
}

/// Why a single inventory line was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The line has no tab separator.
    #[error("line {line}: missing tab separator")]
    MissingSeparator { line: usize },

    /// The hash column is not 64 lowercase hex characters.
    #[error("line {line}: {source}")]
    InvalidHash {
        line: usize,
        #[source]
        source: ParseHashError,
    },

    /// The path column is empty.
    #[error("line {line}: empty path")]
    EmptyPath { line: usize },

    /// A column that must be text is not valid UTF-8.
    #[error("line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

/// Counters for one inventory read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStats {
    /// Well-formed records
    pub accepted: usize,
    /// Malformed lines
    pub rejected: usize,
}

/// Parse one line (without its trailing newline).
///
/// `line_no` is 1-based and only used in error messages.
///
/// # Errors
///
/// Returns [`InventoryError`] for a missing separator, a bad hash, an empty
/// path or a column that is not valid UTF-8 where text is required.
pub fn parse_line(
    line: &[u8],
    order: ColumnOrder,
    line_no: usize,
) -> Result<FileRecord, InventoryError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let hash_first = || split_first_tab(line);
    let path_first = || split_last_tab(line).map(|(p, h)| (h, p));

    let (hash, path) = match order {
        ColumnOrder::HashFirst => hash_first(),
        ColumnOrder::PathFirst => path_first(),
        ColumnOrder::Either => match hash_first() {
            Some((h, p)) if parse_hash(h, line_no).is_ok() => Some((h, p)),
            _ => path_first(),
        },
    }
    .ok_or(InventoryError::MissingSeparator { line: line_no })?;

    let hash = parse_hash(hash, line_no)?;
    if path.is_empty() {
        return Err(InventoryError::EmptyPath { line: line_no });
    }
    let path = path_from_bytes(path).ok_or(InventoryError::InvalidUtf8 { line: line_no })?;

    Ok(FileRecord::new(path, hash))
}

fn split_first_tab(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let idx = line.iter().position(|&b| b == b'\t')?;
    Some((&line[..idx], &line[idx + 1..]))
}

fn split_last_tab(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let idx = line.iter().rposition(|&b| b == b'\t')?;
    Some((&line[..idx], &line[idx + 1..]))
}

fn parse_hash(column: &[u8], line_no: usize) -> Result<ContentHash, InventoryError> {
    let text = std::str::from_utf8(column).map_err(|_| InventoryError::InvalidUtf8 { line: line_no })?;
    text.parse().map_err(|source| InventoryError::InvalidHash {
        line: line_no,
        source,
    })
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

/// Render one record as an inventory line (without newline).
#[must_use]
pub fn format_line(record: &FileRecord, order: ColumnOrder) -> Vec<u8> {
    let hash = record.hash.to_hex();
    let path = path_bytes(&record.path);
    let mut line = Vec::with_capacity(hash.len() + path.len() + 1);
    match order {
        ColumnOrder::HashFirst | ColumnOrder::Either => {
            line.extend_from_slice(hash.as_bytes());
            line.push(b'\t');
            line.extend_from_slice(&path);
        }
        ColumnOrder::PathFirst => {
            line.extend_from_slice(&path);
            line.push(b'\t');
            line.extend_from_slice(hash.as_bytes());
        }
    }
    line
}

/// Read every line of an inventory.
///
/// Blank lines are ignored. Malformed lines are logged at warn level and
/// counted in [`InventoryStats::rejected`].
///
/// # Errors
///
/// Only I/O errors from the underlying reader.
pub fn read_records<R: BufRead>(
    mut reader: R,
    order: ColumnOrder,
) -> io::Result<(Vec<FileRecord>, InventoryStats)> {
    let mut records = Vec::new();
    let mut stats = InventoryStats::default();
    let mut line = Vec::new();
    let mut line_no = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_no += 1;
        let content = line.strip_suffix(b"\n").unwrap_or(&line);
        if content.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match parse_line(content, order, line_no) {
            Ok(record) => {
                stats.accepted += 1;
                records.push(record);
            }
            Err(e) => {
                log::warn!("Rejected inventory record: {}", e);
                stats.rejected += 1;
            }
        }
    }

    log::debug!(
        "Inventory read: {} accepted, {} rejected",
        stats.accepted,
        stats.rejected
    );
    Ok((records, stats))
}

/// Write records, one line each, in the given column order.
///
/// # Errors
///
/// Propagates write errors.
pub fn write_records<W: Write>(
    mut writer: W,
    records: &[FileRecord],
    order: ColumnOrder,
) -> io::Result<()> {
    for record in records {
        writer.write_all(&format_line(record, order))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}
