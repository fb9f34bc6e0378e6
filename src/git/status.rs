//! Working tree status classification using git2.

use git2::{Repository, Status, StatusOptions};

/// Working tree status split into the buckets the collector cares about.
///
/// A file can appear in both `staged` and `unstaged` when it was staged and
/// then edited again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
    pub conflicted: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicted.is_empty()
    }
}

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const UNSTAGED: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

/// Read the working tree status, optionally restricted to `paths`.
///
/// An empty `paths` slice means the whole working tree. Ignored files are
/// never reported.
pub fn read_status(repo: &Repository, paths: &[String]) -> Result<WorkingTreeStatus, git2::Error> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);
    for p in paths {
        opts.pathspec(p);
    }

    let statuses = repo.statuses(Some(&mut opts))?;
    let mut result = WorkingTreeStatus::default();

    for entry in statuses.iter() {
        let Some(path) = entry.path().map(String::from) else {
            continue;
        };
        let status = entry.status();

        if status.is_conflicted() {
            result.conflicted.push(path);
            continue;
        }
        if status.intersects(STAGED) {
            result.staged.push(path.clone());
        }
        if status.intersects(UNSTAGED) {
            result.unstaged.push(path.clone());
        }
        if status.contains(Status::WT_NEW) {
            result.untracked.push(path);
        }
    }

    Ok(result)
}
