//! Pull request creation via octocrab.

use octocrab::Octocrab;
use tracing::debug;

use crate::error::GitHubError;

/// Pull request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Branch with the new commits.
    pub head: String,
    /// Branch to merge into.
    pub base: String,
}

/// The pull request GitHub created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub url: Option<String>,
}

/// Open a pull request, authenticating with `token`.
pub async fn create_pull_request(
    token: &str,
    owner: &str,
    repo: &str,
    request: &NewPullRequest,
) -> Result<CreatedPullRequest, GitHubError> {
    let octocrab = Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| GitHubError::CreatePullRequest(Box::new(e)))?;

    create_pull_request_with_client(&octocrab, owner, repo, request).await
}

/// Open a pull request with an existing client (tests point it at a mock
/// server).
pub async fn create_pull_request_with_client(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    request: &NewPullRequest,
) -> Result<CreatedPullRequest, GitHubError> {
    debug!(
        "Creating pull request {}/{}: {} -> {}",
        owner, repo, request.head, request.base
    );

    let result = octocrab
        .pulls(owner, repo)
        .create(&request.title, &request.head, &request.base)
        .body(&request.body)
        .send()
        .await;

    match result {
        Ok(pr) => Ok(CreatedPullRequest {
            number: pr.number,
            url: pr.html_url.map(|u| u.to_string()),
        }),
        Err(e) => Err(classify_error(e, owner, repo)),
    }
}

/// Map an octocrab failure onto the error the user can act on.
///
/// Checks both Display and Debug output to handle different octocrab error
/// formats.
fn classify_error(e: octocrab::Error, owner: &str, repo: &str) -> GitHubError {
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);
    let display_lower = err_display.to_lowercase();
    let debug_lower = err_debug.to_lowercase();

    if display_lower.contains("rate limit") || debug_lower.contains("rate limit") {
        return GitHubError::RateLimited {
            reset_time: "unknown".to_string(),
        };
    }
    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
        };
    }
    if err_display.contains("Validation Failed") || err_debug.contains("Validation Failed") {
        return GitHubError::PullRequestRejected(validation_detail(&err_debug));
    }
    GitHubError::CreatePullRequest(Box::new(e))
}

/// Markers preceding a message in octocrab's Debug output: the top-level
/// field, and entries of the `errors` JSON array.
const MESSAGE_MARKERS: [&str; 2] = ["message: \"", "\"message\": String(\""];

/// Pull the first specific message GitHub attached to a validation failure,
/// such as "A pull request already exists for owner:branch."
fn validation_detail(err_debug: &str) -> String {
    MESSAGE_MARKERS
        .iter()
        .flat_map(|marker| err_debug.split(*marker).skip(1))
        .filter_map(|rest| rest.split('"').next())
        .find(|m| !m.is_empty() && *m != "Validation Failed")
        .unwrap_or("Validation Failed")
        .to_string()
}

/// Extract owner and repo from a git remote URL.
pub fn parse_github_remote(url: &str) -> Result<(String, String), GitHubError> {
    // Handle SSH format: git@github.com:owner/repo.git
    if let Some(path) = url.strip_prefix("git@github.com:") {
        return parse_owner_repo_path(path);
    }

    // Handle HTTPS and ssh:// formats: https://github.com/owner/repo.git
    if url.contains("github.com/") {
        let path = url
            .split("github.com/")
            .nth(1)
            .ok_or(GitHubError::InvalidRepositoryUrl)?;
        return parse_owner_repo_path(path);
    }

    Err(GitHubError::InvalidRepositoryUrl)
}

fn parse_owner_repo_path(path: &str) -> Result<(String, String), GitHubError> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        [owner, repo, ..] if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GitHubError::InvalidRepositoryUrl),
    }
}
