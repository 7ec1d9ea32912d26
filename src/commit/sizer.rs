//! Size-tiered diff inclusion.
//!
//! Decides how much of the staged diff enters the prompt so that prompt size
//! stays bounded regardless of how large the change is.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::commit::diff::{ChangeSet, DiffStats};
use crate::error::CommitError;

/// Diffs up to this many characters are embedded verbatim.
pub const FULL_DIFF_LIMIT: usize = 15_000;

/// Diffs up to this many characters are truncated; larger ones are dropped.
pub const TRUNCATED_DIFF_LIMIT: usize = 50_000;

/// Number of characters kept from a truncated diff.
pub const TRUNCATE_TO: usize = 12_000;

/// Notice appended to truncated diffs.
pub const TRUNCATION_NOTICE: &str =
    "\n\n[... diff truncated due to size - showing first 12000 characters only]";

/// How much of the diff is exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStrategy {
    Full,
    Truncated,
    StatsOnly,
}

impl DiffStrategy {
    /// Classify a diff by its character count.
    pub fn for_len(char_count: usize) -> Self {
        if char_count <= FULL_DIFF_LIMIT {
            DiffStrategy::Full
        } else if char_count <= TRUNCATED_DIFF_LIMIT {
            DiffStrategy::Truncated
        } else {
            DiffStrategy::StatsOnly
        }
    }
}

impl fmt::Display for DiffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStrategy::Full => write!(f, "FULL"),
            DiffStrategy::Truncated => write!(f, "TRUNCATED"),
            DiffStrategy::StatsOnly => write!(f, "STATS_ONLY"),
        }
    }
}

/// The diff content selected for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPayload {
    /// Character count of the original diff.
    pub char_count: usize,
    pub strategy: DiffStrategy,
    /// Diff text for the prompt; `None` when only statistics are sent.
    pub text: Option<String>,
    /// File statistics (`git diff --stat` output, or computed).
    pub stats: String,
    /// The complete staged diff, whatever the strategy.
    pub raw_diff: String,
}

impl DiffPayload {
    /// Select the diff content for a changeset.
    ///
    /// `stats` is the optional `git diff --stat` output; when absent the
    /// statistics are computed from the diff text. Fails with
    /// [`CommitError::NoStagedChanges`] when there is nothing staged.
    pub fn build(
        changes: &ChangeSet,
        diff: &str,
        stats: Option<&str>,
    ) -> Result<Self, CommitError> {
        if changes.is_empty() && diff.trim().is_empty() {
            return Err(CommitError::NoStagedChanges);
        }

        let char_count = diff.chars().count();
        let strategy = DiffStrategy::for_len(char_count);
        debug!(char_count, %strategy, "Sized diff content");

        let text = match strategy {
            DiffStrategy::Full => Some(diff.to_string()),
            DiffStrategy::Truncated => {
                let mut truncated: String = diff.chars().take(TRUNCATE_TO).collect();
                truncated.push_str(TRUNCATION_NOTICE);
                Some(truncated)
            }
            DiffStrategy::StatsOnly => None,
        };

        let stats = match stats.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => DiffStats::from_diff(diff).to_string(),
        };

        Ok(Self {
            char_count,
            strategy,
            text,
            stats,
            raw_diff: diff.to_string(),
        })
    }

    /// Whether there is diff text to show the model.
    pub fn has_diff_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}
