//! Hash-based duplicate grouping.
//!
//! # Overview
//!
//! Grouping is the barrier between hashing and resolution: a group can only
//! be resolved once every record has been hashed. Records are collected into
//! an ordered map keyed by [`ContentHash`], which gives a globally
//! deterministic group order (ascending hash). "Process only the first K
//! groups" therefore selects the same groups on every run.
//!
//! Within a group, members are sorted lexicographically by path and repeated
//! paths are collapsed, so an inventory that lists a file twice cannot make
//! a file a duplicate of itself.
//!
//! # Example
//!
//! ```
//! use tunedupe::scanner::{ContentHash, FileRecord};
//! use tunedupe::duplicates::group_by_hash;
//! use std::path::PathBuf;
//!
//! let h = ContentHash::of_bytes(b"same");
//! let records = vec![
//!     FileRecord::new(PathBuf::from("/m/b.mp3"), h),
//!     FileRecord::new(PathBuf::from("/m/a.mp3"), h),
//!     FileRecord::new(PathBuf::from("/m/c.mp3"), ContentHash::of_bytes(b"other")),
//! ];
//!
//! let (groups, stats) = group_by_hash(records);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].members[0].path, PathBuf::from("/m/a.mp3"));
//! assert_eq!(stats.unique_hashes, 2);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::scanner::{ContentHash, FileRecord};

/// Files sharing one content hash, at least two of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Shared SHA-256 digest
    pub hash: ContentHash,
    /// Members in lexicographic path order
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Build a group, normalizing member order. Returns `None` when fewer
    /// than two distinct paths remain.
    #[must_use]
    pub fn new(hash: ContentHash, mut members: Vec<FileRecord>) -> Option<Self> {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        members.dedup_by(|a, b| a.path == b.path);
        (members.len() > 1).then_some(Self { hash, members })
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of redundant copies (total - 1 keeper).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }

    /// Paths of the members, in group order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }
}

/// Statistics from the grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Records consumed
    pub total_records: usize,
    /// Distinct hashes seen
    pub unique_hashes: usize,
    /// Groups with 2+ distinct paths
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (excluding one keeper each)
    pub duplicate_files: usize,
}

/// Group records by hash, dropping singletons.
///
/// Groups come back sorted by hash; members sorted by path.
#[must_use]
pub fn group_by_hash<I>(records: I) -> (Vec<DuplicateGroup>, GroupingStats)
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut by_hash: BTreeMap<ContentHash, Vec<FileRecord>> = BTreeMap::new();
    let mut stats = GroupingStats::default();

    for record in records {
        stats.total_records += 1;
        by_hash.entry(record.hash).or_default().push(record);
    }
    stats.unique_hashes = by_hash.len();

    let groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter_map(|(hash, members)| DuplicateGroup::new(hash, members))
        .collect();

    stats.duplicate_groups = groups.len();
    stats.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();

    log::debug!(
        "Grouping: {} records, {} unique hashes, {} duplicate groups",
        stats.total_records,
        stats.unique_hashes,
        stats.duplicate_groups
    );

    (groups, stats)
}
