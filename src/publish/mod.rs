//! Post-commit push and pull request flow.

use std::env;

use git2::Repository;
use tracing::debug;

use crate::commit::{AppliedCommit, Prompter};
use crate::error::PublishError;
use crate::git::branch::current_branch;
use crate::git::remote::{DEFAULT_REMOTE, push_branch, remote_default_branch, remote_url};
use crate::github::{
    CreatedPullRequest, NewPullRequest, create_pull_request, get_github_token,
    parse_github_remote,
};
use crate::report::Reporter;

/// Environment variable overriding the pull request base branch.
pub const PR_BASE_ENV_VAR: &str = "TAXIS_PR_BASE";

const FALLBACK_BASE: &str = "main";

/// What the user asked for after committing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    pub push: bool,
    pub pull_request: bool,
    /// Unattended run: the pull request step is skipped.
    pub auto_accept: bool,
}

/// What the publish step did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub pushed: bool,
    pub pull_request: Option<CreatedPullRequest>,
}

/// Push and/or open a pull request for the commits just made.
///
/// Does nothing when no commits were applied. Failures are returned as-is;
/// the commits themselves stay.
pub async fn publish(
    repo: &Repository,
    applied: &[AppliedCommit],
    options: PublishOptions,
    prompter: &impl Prompter,
    reporter: &Reporter,
) -> Result<PublishReport, PublishError> {
    let mut report = PublishReport::default();
    if applied.is_empty() || !(options.push || options.pull_request) {
        return Ok(report);
    }

    let branch = current_branch(repo).ok_or(PublishError::DetachedHead)?;

    if options.pull_request {
        if options.auto_accept {
            reporter.info("  [SKIP] Pull request (not offered with --yes)");
        } else if prompter.confirm(&format!("Open a pull request for '{}'?", branch))? {
            // Nothing leaves the machine until the remote and auth check out.
            let (owner, name) = parse_github_remote(&remote_url(repo, DEFAULT_REMOTE)?)?;
            let token = get_github_token()?;
            let request = pull_request_for(repo, &branch, applied);

            push_branch(repo, &branch)?;
            report.pushed = true;
            reporter.info(format!("  [DONE] Pushed {}", branch));

            let created = create_pull_request(&token, &owner, &name, &request).await?;
            reporter.info(format!(
                "  [DONE] Opened pull request #{}{}",
                created.number,
                created
                    .url
                    .as_deref()
                    .map(|u| format!(": {u}"))
                    .unwrap_or_default()
            ));
            report.pull_request = Some(created);
        }
    }

    if options.push && !report.pushed {
        push_branch(repo, &branch)?;
        report.pushed = true;
        reporter.info(format!("  [DONE] Pushed {}", branch));
    }

    Ok(report)
}

/// Title, body, head, and base for a pull request covering `applied`.
pub fn pull_request_for(repo: &Repository, branch: &str, applied: &[AppliedCommit]) -> NewPullRequest {
    let title = match applied {
        [only] => only.subject.clone(),
        _ => format!("{}: {} commits", branch, applied.len()),
    };
    let body = applied
        .iter()
        .map(|c| format!("- {}", c.subject))
        .collect::<Vec<_>>()
        .join("\n");

    NewPullRequest {
        title,
        body,
        head: branch.to_string(),
        base: pull_request_base(repo),
    }
}

/// Base branch: `TAXIS_PR_BASE`, else the remote's default branch, else
/// `main`.
fn pull_request_base(repo: &Repository) -> String {
    if let Ok(base) = env::var(PR_BASE_ENV_VAR)
        && !base.trim().is_empty()
    {
        return base.trim().to_string();
    }
    let base = remote_default_branch(repo, DEFAULT_REMOTE).unwrap_or_else(|| FALLBACK_BASE.to_string());
    debug!("Pull request base: {}", base);
    base
}
