//! Staged change collection using git2.
//!
//! Produces the name-status list, the unified patch and the `--stat`
//! summary of the index against HEAD, the same three views
//! `git diff --cached` offers.

use git2::{Delta, Diff, DiffFormat, DiffStatsFormat, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::commit::diff::{ChangeSet, ChangedFile, FileStatus};
use crate::error::CommitError;

/// Width used when rendering the `--stat` summary.
const STAT_WIDTH: usize = 80;

/// Everything the pipeline needs to know about the index.
#[derive(Debug, Clone, Default)]
pub struct StagedChanges {
    pub changes: ChangeSet,
    /// Unified patch of the staged changes.
    pub diff: String,
    /// `git diff --cached --stat` style summary.
    pub stats: String,
}

impl StagedChanges {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Resolve HEAD to a tree, handling unborn branches.
///
/// Returns `None` if HEAD doesn't exist yet (a fresh repo before its first
/// commit).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::git("diff", e)),
    };

    let tree = head_ref
        .peel_to_tree()
        .map_err(|e| CommitError::git("diff", e))?;
    Ok(Some(tree))
}

/// Collect the staged changes of `repo`.
pub fn collect_staged(repo: &Repository) -> Result<StagedChanges, CommitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(|e| CommitError::git("diff", e))?;
    diff.find_similar(None)
        .map_err(|e| CommitError::git("diff", e))?;

    let changes = ChangeSet::new(changed_files(&diff));
    let patch = patch_text(&diff)?;
    let stats = diff
        .stats()
        .and_then(|s| s.to_buf(DiffStatsFormat::FULL, STAT_WIDTH))
        .map_err(|e| CommitError::git("diff", e))?;
    let stats = String::from_utf8_lossy(&stats).trim_end().to_string();

    debug!(
        files = changes.len(),
        diff_chars = patch.chars().count(),
        "Collected staged changes"
    );

    Ok(StagedChanges {
        changes,
        diff: patch,
        stats,
    })
}

fn changed_files(diff: &Diff<'_>) -> Vec<ChangedFile> {
    diff.deltas()
        .filter_map(|delta| {
            let status = match delta.status() {
                Delta::Added | Delta::Untracked => FileStatus::Added,
                Delta::Deleted => FileStatus::Deleted,
                Delta::Renamed => FileStatus::Renamed,
                Delta::Copied => FileStatus::Copied,
                Delta::Typechange => FileStatus::TypeChanged,
                _ => FileStatus::Modified,
            };

            let new_path = delta.new_file().path().map(|p| p.to_string_lossy().to_string());
            let old_path = delta.old_file().path().map(|p| p.to_string_lossy().to_string());

            let (path, old_path) = match status {
                FileStatus::Renamed | FileStatus::Copied => {
                    (new_path.clone().or_else(|| old_path.clone())?, old_path)
                }
                _ => (new_path.or(old_path)?, None),
            };

            Some(ChangedFile {
                path,
                status,
                old_path,
            })
        })
        .collect()
}

/// Render the diff as unified patch text.
fn patch_text(diff: &Diff<'_>) -> Result<String, CommitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        // Include the origin character for content lines
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| CommitError::git("diff", e))?;
    Ok(text)
}
