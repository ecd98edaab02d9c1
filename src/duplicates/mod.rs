//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Hash-based grouping of file records
//! - Filename cleanliness scoring
//! - Keeper selection within a group

pub mod groups;
pub mod resolver;
pub mod score;

pub use groups::{group_by_hash, DuplicateGroup, GroupingStats};
pub use resolver::{resolve, Resolution, ResolveError, ScoredRecord};
pub use score::{clean_score, ScoreRule, SCORE_RULES};
