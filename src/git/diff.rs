//! Diff collection from the index or working tree using git2.

use std::fmt;

use git2::{Delta, Diff, DiffFormat, DiffOptions, ErrorCode, Patch, Repository, Tree};
use tracing::warn;

/// Which set of changes a diff covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffScope {
    /// HEAD against the index: the user already staged an intentional scope.
    Staged,
    /// HEAD against the working tree (untracked files included), optionally
    /// restricted to the given paths. Empty means the whole tree.
    WorkingTree(Vec<String>),
}

/// Status of a changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
        }
    }
}

/// Per-file change counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
    pub insertions: usize,
    pub deletions: usize,
    pub binary: bool,
}

/// Diff summary plus the full unified diff text.
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub files: Vec<FileChange>,
    pub diff_text: String,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
pub fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, git2::Error> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    Ok(Some(head_ref.peel_to_tree()?))
}

/// Collect the diff for the given scope.
pub fn collect_diff(repo: &Repository, scope: &DiffScope) -> Result<DiffSummary, git2::Error> {
    let head_tree = resolve_head_tree(repo)?;

    let diff = match scope {
        DiffScope::Staged => {
            let mut opts = DiffOptions::new();
            repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?
        }
        DiffScope::WorkingTree(paths) => {
            let mut opts = DiffOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .show_untracked_content(true);
            for p in paths {
                opts.pathspec(p);
            }
            repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?
        }
    };

    build_summary(&diff)
}

fn build_summary(diff: &Diff<'_>) -> Result<DiffSummary, git2::Error> {
    let mut files = Vec::with_capacity(diff.deltas().len());

    for idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };

        let status = match delta.status() {
            Delta::Added | Delta::Untracked => FileStatus::Added,
            Delta::Deleted => FileStatus::Deleted,
            Delta::Renamed => FileStatus::Renamed,
            _ => FileStatus::Modified,
        };

        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        let (path, old_path) = match status {
            FileStatus::Renamed => (new_path.clone().or_else(|| old_path.clone()), old_path),
            _ => (new_path.or(old_path), None),
        };
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            continue;
        };

        // Loading the patch is what runs binary detection on the delta.
        let (insertions, deletions, binary) = match Patch::from_diff(diff, idx)? {
            Some(patch) => {
                let (_, added, removed) = patch.line_stats()?;
                (added, removed, patch.delta().flags().is_binary())
            }
            None => (0, 0, true),
        };

        files.push(FileChange {
            path,
            status,
            old_path,
            insertions,
            deletions,
            binary,
        });
    }

    let insertions = files.iter().map(|f| f.insertions).sum();
    let deletions = files.iter().map(|f| f.deletions).sum();

    Ok(DiffSummary {
        files,
        diff_text: diff_text(diff),
        insertions,
        deletions,
    })
}

/// Render the unified diff text, prefixing content lines with their origin.
fn diff_text(diff: &Diff<'_>) -> String {
    let mut text = String::new();

    if let Err(e) = diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    }) {
        warn!("Failed to collect diff text: {e}");
    }

    text
}
