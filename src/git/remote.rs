//! Remote operations: push and remote metadata.
//!
//! Pushing shells out to the system `git` binary, inheriting the user's
//! existing git config, SSH agent, and credential store.

use std::path::Path;
use std::process::Command;

use git2::Repository;

use crate::error::PublishError;

/// Name of the remote taxis publishes to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Push the current branch.
///
/// When the branch has no upstream yet, pushes with `-u <remote> <branch>`
/// so later pushes and the pull request find it.
pub fn push_branch(repo: &Repository, branch: &str) -> Result<(), PublishError> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| PublishError::GitFailed("Bare repository not supported".into()))?;

    let result = if has_upstream(repo, branch) {
        run_git(workdir, &["push"], "push")
    } else {
        run_git(
            workdir,
            &["push", "--set-upstream", DEFAULT_REMOTE, branch],
            "push",
        )
    };

    result.map_err(|e| PublishError::PushFailed(e.to_string()))
}

/// Whether `branch` already tracks a remote branch.
fn has_upstream(repo: &Repository, branch: &str) -> bool {
    repo.config()
        .and_then(|config| config.get_string(&format!("branch.{branch}.remote")))
        .is_ok_and(|remote| !remote.trim().is_empty())
}

/// URL of the given remote.
pub fn remote_url(repo: &Repository, remote: &str) -> Result<String, PublishError> {
    repo.find_remote(remote)
        .ok()
        .and_then(|r| r.url().map(String::from))
        .ok_or_else(|| PublishError::MissingRemote(remote.to_string()))
}

/// Branch the remote considers its default, from `refs/remotes/<remote>/HEAD`.
pub fn remote_default_branch(repo: &Repository, remote: &str) -> Option<String> {
    let reference = repo
        .find_reference(&format!("refs/remotes/{remote}/HEAD"))
        .ok()?;
    let target = reference.symbolic_target()?;
    target
        .strip_prefix(&format!("refs/remotes/{remote}/"))
        .map(String::from)
}

/// Run a git command in `dir` and return success or a descriptive error.
fn run_git(dir: &Path, args: &[&str], operation: &str) -> Result<(), PublishError> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|e| PublishError::GitFailed(format!("Failed to run git {}: {}", operation, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PublishError::GitFailed(format!(
            "git {} failed: {}",
            operation,
            stderr.trim()
        )));
    }

    Ok(())
}
