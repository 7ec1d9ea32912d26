//! Staging, committing and pushing.

use std::path::Path;
use std::process::Stdio;

use git2::{IndexAddOption, Oid, Repository};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::CommitError;

/// Stage every change in the working tree, like `git add .`.
///
/// Uses `index.add_all()` for new and modified files and `index.update_all()`
/// so deletions are staged too.
pub fn stage_all(repo: &Repository) -> Result<(), CommitError> {
    let mut index = repo.index().map_err(|e| CommitError::git("add", e))?;
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .map_err(|e| CommitError::git("add", e))?;
    index
        .update_all(["*"].iter(), None)
        .map_err(|e| CommitError::git("add", e))?;
    index.write().map_err(|e| CommitError::git("add", e))?;
    debug!("Staged all changes");
    Ok(())
}

/// Commit the current index on HEAD with `message`.
///
/// The signature comes from git config. Works on an unborn branch.
pub fn create_commit(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(|e| CommitError::git("commit", e))?;
    let tree_id = index
        .write_tree()
        .map_err(|e| CommitError::git("commit", e))?;
    let tree = repo
        .find_tree(tree_id)
        .map_err(|e| CommitError::git("commit", e))?;

    let sig = repo
        .signature()
        .map_err(|e| CommitError::git("commit", format!("no author identity configured ({e}). Set user.name and user.email")))?;

    // No parent on the first commit
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(|e| CommitError::git("commit", e))?;
    info!(%oid, "Created commit");
    Ok(oid)
}

/// Run `git push origin` in `repo_dir`.
pub async fn push_origin(repo_dir: &Path) -> Result<(), CommitError> {
    let git = which::which("git")
        .map_err(|e| CommitError::git("push", format!("git executable not found: {e}")))?;

    let output = Command::new(git)
        .args(["push", "origin"])
        .current_dir(repo_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CommitError::git("push", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CommitError::git("push", stderr));
    }

    info!("Pushed to origin");
    Ok(())
}
