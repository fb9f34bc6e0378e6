//! Change collection.
//!
//! Validates the repository preconditions (no conflicts, no ambiguous
//! staged + path selection, something to commit) and snapshots the pending
//! changes a run works on. Every query here is read-only.

use std::path::{Component, Path, PathBuf};

use git2::Repository;
use tracing::{debug, warn};

use crate::error::CollectError;
use crate::git::{
    DiffScope, DiffSummary, WorkingTreeStatus, collect_diff, current_branch, read_status,
    recent_subjects,
};

/// Snapshot of the pending changes, produced once per run.
#[derive(Debug, Clone)]
pub struct RepositoryState {
    pub status: WorkingTreeStatus,
    pub scope: DiffScope,
    pub diff: DiffSummary,
    pub branch: Option<String>,
    /// Recent commit subjects, newest first, when history was requested and
    /// could be read.
    pub history: Option<Vec<String>>,
}

impl RepositoryState {
    /// Paths the diff covers, in diff order.
    pub fn changed_paths(&self) -> Vec<&str> {
        self.diff.files.iter().map(|f| f.path.as_str()).collect()
    }
}

/// Open the repository containing `path`.
pub fn open_repository(path: &Path) -> Result<Repository, CollectError> {
    Repository::discover(path).map_err(CollectError::NotARepository)
}

/// Turn path filters as typed on the command line into pathspecs relative to
/// the working tree root.
///
/// Relative filters are taken from `cwd`, and `.`/`..` are folded. A filter
/// naming the root itself selects the whole tree, so the result is empty.
pub fn resolve_path_filters(
    repo: &Repository,
    cwd: &Path,
    paths: &[String],
) -> Result<Vec<String>, CollectError> {
    let Some(workdir) = repo.workdir() else {
        return Ok(paths.to_vec());
    };
    let root = real_path(workdir);
    let base = real_path(cwd);

    let mut resolved = Vec::with_capacity(paths.len());
    for raw in paths {
        let absolute = real_path(&base.join(raw));
        let relative = absolute
            .strip_prefix(&root)
            .map_err(|_| CollectError::PathOutsideRepository(raw.clone()))?;
        if relative.as_os_str().is_empty() {
            debug!("Path filter '{}' is the repository root, using the whole tree", raw);
            return Ok(Vec::new());
        }
        let spec = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        resolved.push(spec);
    }
    Ok(resolved)
}

/// Lexically normalized `path` with its deepest existing ancestor resolved
/// through the filesystem. Deleted files keep a usable path.
fn real_path(path: &Path) -> PathBuf {
    let mut lexical = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    for ancestor in lexical.ancestors() {
        if let Ok(real) = ancestor.canonicalize() {
            return match lexical.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => real.join(rest),
                _ => real,
            };
        }
    }
    lexical
}

/// Collect the repository state for the given path filters.
///
/// An empty `paths` slice means the whole working tree. When files are
/// already staged, the staged set is the scope and path filters are refused.
/// `history` is the number of recent commit subjects to include; failure to
/// read them only degrades the context.
pub fn collect_changes(
    repo: &Repository,
    paths: &[String],
    history: Option<usize>,
) -> Result<RepositoryState, CollectError> {
    let full_status = read_status(repo, &[]).map_err(CollectError::QueryFailed)?;

    if full_status.has_conflicts() {
        return Err(CollectError::MergeConflict(full_status.conflicted));
    }

    if full_status.has_staged() && !paths.is_empty() {
        return Err(CollectError::AmbiguousPathSelection);
    }

    let (scope, status) = if full_status.has_staged() {
        (DiffScope::Staged, full_status)
    } else if paths.is_empty() {
        (DiffScope::WorkingTree(Vec::new()), full_status)
    } else {
        let filtered = read_status(repo, paths).map_err(CollectError::QueryFailed)?;
        (DiffScope::WorkingTree(paths.to_vec()), filtered)
    };

    if status.is_clean() {
        return Err(CollectError::CleanTree);
    }

    let diff = collect_diff(repo, &scope).map_err(CollectError::QueryFailed)?;
    if diff.is_empty() {
        return Err(CollectError::CleanTree);
    }

    debug!(
        "Collected {} file(s), +{} -{}, scope {:?}",
        diff.files.len(),
        diff.insertions,
        diff.deletions,
        scope
    );

    let history = history.and_then(|limit| match recent_subjects(repo, limit) {
        Ok(subjects) => Some(subjects),
        Err(e) => {
            warn!("Could not read commit history, continuing without it: {e}");
            None
        }
    });

    Ok(RepositoryState {
        status,
        scope,
        diff,
        branch: current_branch(repo),
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("base.txt"), "base\n").unwrap();
        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("base.txt")).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = git2::Signature::now("Test", "test@test.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "chore: init", &tree, &[])
                .unwrap();
        }
        (dir, repo)
    }

    #[test]
    fn test_clean_tree() {
        let (_dir, repo) = init_repo();
        assert!(matches!(
            collect_changes(&repo, &[], None),
            Err(CollectError::CleanTree)
        ));
    }

    #[test]
    fn test_clean_under_path_filter() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("other.txt"), "x\n").unwrap();
        let result = collect_changes(&repo, &["src".to_string()], None);
        assert!(matches!(result, Err(CollectError::CleanTree)));
    }

    #[test]
    fn test_staged_plus_paths_is_ambiguous() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("staged.txt"), "s\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        let result = collect_changes(&repo, &["staged.txt".to_string()], None);
        assert!(matches!(result, Err(CollectError::AmbiguousPathSelection)));
    }

    #[test]
    fn test_staged_changes_define_scope() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("staged.txt"), "s\n").unwrap();
        std::fs::write(dir.path().join("loose.txt"), "l\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        let state = collect_changes(&repo, &[], None).unwrap();
        assert_eq!(state.scope, DiffScope::Staged);
        assert_eq!(state.changed_paths(), vec!["staged.txt"]);
    }

    #[test]
    fn test_working_tree_with_history() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("base.txt"), "changed\n").unwrap();

        let state = collect_changes(&repo, &[], Some(5)).unwrap();
        assert_eq!(state.scope, DiffScope::WorkingTree(Vec::new()));
        assert_eq!(state.history, Some(vec!["chore: init".to_string()]));
        assert!(state.branch.is_some());
        assert_eq!(state.status.unstaged, vec!["base.txt"]);
    }

    fn with_modified_src(dir: &Path) {
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("src/a.txt"), "a\n").unwrap();
        std::fs::write(dir.join("top.txt"), "t\n").unwrap();
    }

    #[test]
    fn test_path_filters_resolve_from_repository_root() {
        let (dir, repo) = init_repo();
        with_modified_src(dir.path());

        for filter in ["./src", "src/", "src/../src/a.txt"] {
            let paths = resolve_path_filters(&repo, dir.path(), &[filter.to_string()]).unwrap();
            let state = collect_changes(&repo, &paths, None).unwrap();
            assert_eq!(state.changed_paths(), vec!["src/a.txt"], "filter {filter}");
        }
    }

    #[test]
    fn test_path_filters_resolve_from_subdirectory() {
        let (dir, repo) = init_repo();
        with_modified_src(dir.path());
        let cwd = dir.path().join("src");

        let paths = resolve_path_filters(&repo, &cwd, &["a.txt".to_string()]).unwrap();
        assert_eq!(paths, vec!["src/a.txt"]);
        let paths = resolve_path_filters(&repo, &cwd, &["../top.txt".to_string()]).unwrap();
        assert_eq!(paths, vec!["top.txt"]);
    }

    #[test]
    fn test_absolute_path_filter() {
        let (dir, repo) = init_repo();
        with_modified_src(dir.path());
        let absolute = dir.path().join("src/a.txt").to_string_lossy().into_owned();

        let paths = resolve_path_filters(&repo, dir.path(), &[absolute]).unwrap();
        let state = collect_changes(&repo, &paths, None).unwrap();
        assert_eq!(state.changed_paths(), vec!["src/a.txt"]);
    }

    #[test]
    fn test_deleted_file_filter_resolves() {
        let (dir, repo) = init_repo();
        std::fs::remove_file(dir.path().join("base.txt")).unwrap();

        let paths = resolve_path_filters(&repo, dir.path(), &["base.txt".to_string()]).unwrap();
        assert_eq!(paths, vec!["base.txt"]);
    }

    #[test]
    fn test_root_filter_selects_whole_tree() {
        let (dir, repo) = init_repo();
        let cwd = dir.path().join("src");
        std::fs::create_dir_all(&cwd).unwrap();

        let paths = resolve_path_filters(&repo, &cwd, &["..".to_string()]).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_path_outside_repository_is_refused() {
        let (dir, repo) = init_repo();
        let result = resolve_path_filters(&repo, dir.path(), &["../elsewhere".to_string()]);
        assert!(matches!(
            result,
            Err(CollectError::PathOutsideRepository(p)) if p == "../elsewhere"
        ));
    }

    #[test]
    fn test_unreadable_history_is_dropped() {
        let (dir, repo) = init_repo();
        let parent = repo.head().unwrap().target().unwrap();
        {
            let head = repo.find_commit(parent).unwrap();
            let tree = head.tree().unwrap();
            let sig = git2::Signature::now("Test", "test@test.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "chore: second", &tree, &[&head])
                .unwrap();
        }
        let hex = parent.to_string();
        std::fs::remove_file(dir.path().join(".git/objects").join(&hex[..2]).join(&hex[2..])).unwrap();
        std::fs::write(dir.path().join("base.txt"), "changed\n").unwrap();

        let state = collect_changes(&repo, &[], Some(5)).unwrap();
        assert_eq!(state.history, None);
        assert_eq!(state.changed_paths(), vec!["base.txt"]);
    }
}
