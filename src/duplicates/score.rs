//! Filename cleanliness scoring.
//!
//! Copies made by file managers and download tools tend to pick up suffixes
//! like `-1`, ` (2)` or ` copy`. The score of a basename is the sum of the
//! penalties of every rule in [`SCORE_RULES`] whose pattern matches the end
//! of the stem, plus one point per ten characters of the basename. Lower is
//! cleaner; the resolver keeps the lowest-scoring member of a group.
//!
//! ```
//! use tunedupe::duplicates::clean_score;
//!
//! assert_eq!(clean_score("song.mp3"), 0);
//! assert_eq!(clean_score("song-1.mp3"), 101);
//! assert_eq!(clean_score("song (1).mp3"), 101);
//! assert_eq!(clean_score("song copy.mp3"), 81);
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// One penalty rule, matched against the filename stem.
#[derive(Debug)]
pub struct ScoreRule {
    /// Stable identifier, used in debug logging
    pub name: &'static str,
    /// Pattern anchored at the end of the stem
    pub pattern: &'static str,
    /// Points added when the pattern matches
    pub weight: u32,
}

/// Penalty rules, applied in order. Every matching rule adds its weight.
pub const SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "numeric-suffix",
        pattern: r"-[0-9]+$",
        weight: 100,
    },
    ScoreRule {
        name: "parenthesized-counter",
        pattern: r" \([0-9]+\)$",
        weight: 100,
    },
    ScoreRule {
        name: "copy",
        pattern: r"(?i)copy( [0-9]+)?$",
        weight: 80,
    },
    ScoreRule {
        name: "dash-copy",
        pattern: r"(?i) - copy( [0-9]+)?$",
        weight: 80,
    },
    ScoreRule {
        name: "underscore-copy",
        pattern: r"_copy( [0-9]+)?$",
        weight: 80,
    },
];

static COMPILED_RULES: LazyLock<Vec<(&'static ScoreRule, Regex)>> = LazyLock::new(|| {
    SCORE_RULES
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(re) => Some((rule, re)),
            Err(e) => {
                log::error!("Invalid score rule '{}': {}", rule.name, e);
                None
            }
        })
        .collect()
});

impl ScoreRule {
    /// Whether this rule fires for `stem`.
    #[must_use]
    pub fn matches(&self, stem: &str) -> bool {
        COMPILED_RULES
            .iter()
            .find(|(rule, _)| rule.name == self.name)
            .is_some_and(|(_, re)| re.is_match(stem))
    }
}

/// Basename minus its final extension. A leading dot does not start an
/// extension, so `.hidden` is its own stem.
#[must_use]
pub fn stem(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(idx) if idx > 0 => &basename[..idx],
        _ => basename,
    }
}

/// Length component of the score.
#[must_use]
pub fn length_penalty(basename: &str) -> u32 {
    u32::try_from(basename.chars().count() / 10).unwrap_or(u32::MAX)
}

/// Cleanliness score of a basename. Pure and deterministic.
#[must_use]
pub fn clean_score(basename: &str) -> u32 {
    let stem = stem(basename);
    let penalties: u32 = COMPILED_RULES
        .iter()
        .filter(|(_, re)| re.is_match(stem))
        .map(|(rule, _)| {
            log::trace!("Score rule '{}' matched '{}'", rule.name, basename);
            rule.weight
        })
        .sum();
    penalties.saturating_add(length_penalty(basename))
}
