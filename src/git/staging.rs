//! Staging exact file lists and committing them on top of HEAD.

use std::path::Path;

use git2::{Commit, ErrorCode, Index, Repository};
use tracing::debug;

use crate::error::CommitError;

/// Identity and change statistics of a commit that was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl CommitSummary {
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}

/// Version-control mutations the commit applier needs.
///
/// This abstraction allows mocking staging and commit failures in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Vcs {
    /// Stage exactly `files` from the working tree.
    fn stage_files(&self, files: &[String]) -> Result<(), CommitError>;

    /// Create one commit containing exactly `files` as currently staged.
    fn commit_files(&self, message: &str, files: &[String]) -> Result<CommitSummary, CommitError>;
}

/// [`Vcs`] backed by a git2 repository.
pub struct GitVcs<'repo> {
    repo: &'repo Repository,
}

impl<'repo> GitVcs<'repo> {
    pub fn new(repo: &'repo Repository) -> Self {
        Self { repo }
    }
}

impl Vcs for GitVcs<'_> {
    fn stage_files(&self, files: &[String]) -> Result<(), CommitError> {
        stage_paths(self.repo, files)
    }

    fn commit_files(&self, message: &str, files: &[String]) -> Result<CommitSummary, CommitError> {
        commit_paths(self.repo, message, files)
    }
}

/// Stage the given paths (like `git add -A -- <paths>`).
///
/// Files present in the working tree are added; files that disappeared are
/// removed from the index. A path that exists nowhere (working tree, index,
/// or HEAD) is an error.
pub fn stage_paths(repo: &Repository, paths: &[String]) -> Result<(), CommitError> {
    let workdir = repo.workdir().ok_or(CommitError::BareRepository)?;
    let head_tree = head_commit(repo)?
        .map(|c| c.tree())
        .transpose()
        .map_err(CommitError::StagingFailed)?;
    let mut index = repo.index().map_err(CommitError::StagingFailed)?;

    for p in paths {
        let path = Path::new(p);
        if workdir.join(path).symlink_metadata().is_ok() {
            index.add_path(path).map_err(CommitError::StagingFailed)?;
        } else if index.get_path(path, 0).is_some() {
            index.remove_path(path).map_err(CommitError::StagingFailed)?;
        } else if head_tree
            .as_ref()
            .is_some_and(|tree| tree.get_path(path).is_ok())
        {
            // Deletion is already staged.
            continue;
        } else {
            return Err(CommitError::UnknownPath(p.clone()));
        }
    }

    index.write().map_err(CommitError::StagingFailed)?;
    debug!("Staged {} path(s)", paths.len());
    Ok(())
}

/// Commit exactly `paths` as they appear in the index (like
/// `git commit -m <message> -- <paths>` after staging them).
///
/// The new tree is HEAD's tree with only those paths replaced, so anything
/// else that happens to be staged stays staged for a later commit.
pub fn commit_paths(
    repo: &Repository,
    message: &str,
    paths: &[String],
) -> Result<CommitSummary, CommitError> {
    let parent = head_commit(repo)?;
    let parent_tree = parent
        .as_ref()
        .map(|c| c.tree())
        .transpose()
        .map_err(CommitError::CommitFailed)?;

    let mut scratch = Index::new().map_err(CommitError::CommitFailed)?;
    if let Some(tree) = &parent_tree {
        scratch.read_tree(tree).map_err(CommitError::CommitFailed)?;
    }

    let index = repo.index().map_err(CommitError::CommitFailed)?;
    for p in paths {
        let path = Path::new(p);
        match index.get_path(path, 0) {
            Some(entry) => scratch.add(&entry).map_err(CommitError::CommitFailed)?,
            None if scratch.get_path(path, 0).is_some() => {
                scratch.remove_path(path).map_err(CommitError::CommitFailed)?;
            }
            None => {}
        }
    }

    let tree_id = scratch
        .write_tree_to(repo)
        .map_err(CommitError::CommitFailed)?;
    let unchanged = match &parent_tree {
        Some(tree) => tree.id() == tree_id,
        None => scratch.is_empty(),
    };
    if unchanged {
        return Err(CommitError::EmptyCommit(paths.join(", ")));
    }

    let tree = repo
        .find_tree(tree_id)
        .map_err(CommitError::CommitFailed)?;
    let sig = repo.signature().map_err(CommitError::ConfigError)?;
    let parents: Vec<&Commit> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)?;

    let stats = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .and_then(|diff| diff.stats())
        .map_err(CommitError::CommitFailed)?;

    Ok(CommitSummary {
        hash: oid.to_string(),
        files_changed: stats.files_changed(),
        insertions: stats.insertions(),
        deletions: stats.deletions(),
    })
}

/// HEAD's commit, or `None` on an unborn branch.
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, CommitError> {
    match repo.head() {
        Ok(head) => head
            .peel_to_commit()
            .map(Some)
            .map_err(CommitError::CommitFailed),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(CommitError::CommitFailed(e)),
    }
}
