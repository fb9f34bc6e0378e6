//! Recent commit history used as style context for the model.

use git2::{ErrorCode, Repository, Sort};

use crate::error::GitError;

/// Default number of commit subjects included with `--history`.
pub const DEFAULT_HISTORY_COUNT: usize = 10;

/// Environment variable to override the history length.
const HISTORY_ENV_VAR: &str = "TAXIS_HISTORY_COUNT";

/// Number of commits to include, from `TAXIS_HISTORY_COUNT` or the default.
pub fn history_count() -> usize {
    match std::env::var(HISTORY_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    "Invalid {} value '{}', using default {}",
                    HISTORY_ENV_VAR,
                    v,
                    DEFAULT_HISTORY_COUNT
                );
                DEFAULT_HISTORY_COUNT
            }
        },
        _ => DEFAULT_HISTORY_COUNT,
    }
}

/// Fetch the subject lines of the last `limit` commits reachable from HEAD,
/// newest first. An unborn branch has no history and yields an empty list.
pub fn recent_subjects(repo: &Repository, limit: usize) -> Result<Vec<String>, GitError> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(Vec::new());
        }
        Err(e) => return Err(GitError::Head(e)),
    };
    let head_oid = head.target().ok_or_else(|| {
        GitError::Head(git2::Error::from_str("HEAD does not point to a commit"))
    })?;

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL)
        .map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;

    let mut subjects = Vec::with_capacity(limit);
    for oid in revwalk.take(limit) {
        let oid = oid.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        let subject = commit.summary().unwrap_or("").trim().to_string();
        if !subject.is_empty() {
            subjects.push(subject);
        }
    }

    Ok(subjects)
}
