//! File actions module.
//!
//! This module provides functionality for:
//! - Relocating duplicates into the quarantine tree
//! - Dry-run classification of the same moves
//!
//! # Relocation
//!
//! The relocate module moves files with a strict no-overwrite, no-rename
//! policy:
//! - Destination mirrors the source's path relative to the scan root
//! - Existing destinations are reported as conflicts, never replaced
//! - Exclusive reservation of the destination before the rename
//! - Copy, verify, then delete when the rename would cross filesystems
//!
//! ```no_run
//! use tunedupe::actions::{MoveMode, Mover};
//! use std::path::Path;
//!
//! let mover = Mover::new(Path::new("/music"), Path::new("/music/DUPES"), MoveMode::Execute);
//! ```

pub mod relocate;

pub use relocate::{ConflictReason, MoveMode, MoveOutcome, MoveReport, Mover, RelocateError};
