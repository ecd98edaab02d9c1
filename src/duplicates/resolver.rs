//! Keeper selection for a duplicate group.
//!
//! The keeper is the member with the lowest [`clean_score`]. Ties are broken
//! explicitly by lexicographic path order (the earliest path wins), so the
//! choice never depends on the order records happened to arrive in.

use thiserror::Error;

use super::score::clean_score;
use super::DuplicateGroup;
use crate::scanner::{ContentHash, FileRecord};

/// A group member together with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRecord {
    pub record: FileRecord,
    pub score: u32,
}

impl ScoredRecord {
    fn new(record: FileRecord) -> Self {
        let score = clean_score(&record.basename());
        Self { record, score }
    }
}

/// Outcome of resolving one group: one keeper, the rest to relocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Shared hash of the group
    pub hash: ContentHash,
    /// The member left in place
    pub keeper: ScoredRecord,
    /// Every other member, in path order
    pub candidates: Vec<ScoredRecord>,
}

/// Errors raised by [`resolve`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A group needs at least two members to have anything to resolve.
    #[error("group {hash} has {members} member(s); at least 2 are required")]
    TooFewMembers { hash: ContentHash, members: usize },
}

/// Pick the keeper of a group and list the move candidates.
///
/// # Errors
///
/// Returns [`ResolveError::TooFewMembers`] for groups with fewer than two
/// members.
pub fn resolve(group: &DuplicateGroup) -> Result<Resolution, ResolveError> {
    if group.members.len() < 2 {
        return Err(ResolveError::TooFewMembers {
            hash: group.hash,
            members: group.members.len(),
        });
    }

    let mut scored: Vec<ScoredRecord> = group
        .members
        .iter()
        .cloned()
        .map(ScoredRecord::new)
        .collect();

    let keeper_idx = scored
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.score
                .cmp(&b.score)
                .then_with(|| a.record.path.cmp(&b.record.path))
        })
        .map(|(idx, _)| idx)
        .ok_or(ResolveError::TooFewMembers {
            hash: group.hash,
            members: 0,
        })?;

    let keeper = scored.remove(keeper_idx);
    scored.sort_by(|a, b| a.record.path.cmp(&b.record.path));

    log::debug!(
        "Group {}: keeping {} (score {}), {} candidate(s)",
        group.hash,
        keeper.record.path.display(),
        keeper.score,
        scored.len()
    );

    Ok(Resolution {
        hash: group.hash,
        keeper,
        candidates: scored,
    })
}
