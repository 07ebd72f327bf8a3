//! Version control for the shared data repository.
//!
//! The data repo syncs across machines through an ordinary git remote.
//! A data dir that is not a git repository is a valid local-only setup,
//! so pull and push quietly become no-ops there. Genuine git failures
//! (diverged remote, unreachable network) surface as errors the
//! orchestrator records without aborting the run.

use async_trait::async_trait;
use std::path::Path;

use crate::error::GitError;

/// Remote synchronization seam for the data repository.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Pull the latest state from the remote.
    async fn pull(&self, repo_path: &Path) -> Result<(), GitError>;

    /// Stage everything, commit with the given message, and push.
    ///
    /// Returns false when the worktree was clean and nothing was
    /// committed.
    async fn commit_and_push(&self, repo_path: &Path, message: &str) -> Result<bool, GitError>;
}

/// [`VersionControl`] backed by the `git` CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

async fn run_git(
    repo_path: &Path,
    args: &[&str],
    op: &'static str,
) -> Result<std::process::Output, GitError> {
    tokio::process::Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::Unavailable("git is not installed".to_string())
            } else {
                GitError::CommandFailed {
                    op,
                    detail: e.to_string(),
                }
            }
        })
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl VersionControl for GitCli {
    async fn pull(&self, repo_path: &Path) -> Result<(), GitError> {
        if !repo_path.join(".git").exists() {
            tracing::debug!(repo = %repo_path.display(), "Not a git repository, skipping pull");
            return Ok(());
        }

        // Fast-forward only: divergence is surfaced, not merged
        let output = run_git(repo_path, &["pull", "--ff-only"], "pull").await?;
        if output.status.success() {
            tracing::debug!(repo = %repo_path.display(), "Pulled data repo");
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                op: "pull",
                detail: stderr_of(&output),
            })
        }
    }

    async fn commit_and_push(&self, repo_path: &Path, message: &str) -> Result<bool, GitError> {
        if !repo_path.join(".git").exists() {
            tracing::debug!(repo = %repo_path.display(), "Not a git repository, skipping push");
            return Ok(false);
        }

        let add = run_git(repo_path, &["add", "-A"], "add").await?;
        if !add.status.success() {
            return Err(GitError::CommandFailed {
                op: "add",
                detail: stderr_of(&add),
            });
        }

        // Exit 0 means nothing is staged
        let staged = run_git(repo_path, &["diff", "--cached", "--quiet"], "diff").await?;
        if staged.status.success() {
            tracing::debug!("Worktree clean, nothing to push");
            return Ok(false);
        }

        let commit = run_git(repo_path, &["commit", "-m", message, "--no-verify"], "commit").await?;
        if !commit.status.success() {
            return Err(GitError::CommandFailed {
                op: "commit",
                detail: stderr_of(&commit),
            });
        }
        tracing::info!(message = %message, "Committed data repo changes");

        // A failed push leaves the commit local; the next push retries it
        let push = run_git(repo_path, &["push"], "push").await?;
        if !push.status.success() {
            return Err(GitError::CommandFailed {
                op: "push",
                detail: stderr_of(&push),
            });
        }

        tracing::info!("Pushed data repo");
        Ok(true)
    }
}
