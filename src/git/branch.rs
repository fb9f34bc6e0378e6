//! Current branch lookup and Jira ticket extraction.

use std::sync::LazyLock;

use git2::{ErrorCode, Repository};
use regex_lite::Regex;

static JIRA_TICKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}-\d+").expect("valid Jira ticket pattern"));

/// Name of the branch HEAD points at.
///
/// Returns `None` for a detached HEAD. An unborn branch (fresh repository)
/// still reports the name it will get on the first commit.
pub fn current_branch(repo: &Repository) -> Option<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => head.shorthand().map(String::from),
        Ok(_) => None,
        Err(e) if e.code() == ErrorCode::UnbornBranch => repo
            .find_reference("HEAD")
            .ok()
            .and_then(|r| r.symbolic_target().map(String::from))
            .map(|target| {
                target
                    .strip_prefix("refs/heads/")
                    .unwrap_or(&target)
                    .to_string()
            }),
        Err(_) => None,
    }
}

/// Extract the first Jira ticket ID (e.g. `PROJ-123`) from a branch name.
pub fn extract_jira_ticket(branch: &str) -> Option<String> {
    JIRA_TICKET.find(branch).map(|m| m.as_str().to_string())
}
