//! Error types for taxis modules using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from collecting the repository state.
///
/// `CleanTree` is a terminal "nothing to do" condition rather than a failure;
/// the pipeline maps it to a successful exit.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Not a git repository. Run taxis from within a git repository. ({0})")]
    NotARepository(#[source] git2::Error),

    #[error("Resolve merge conflicts before committing: {}", .0.join(", "))]
    MergeConflict(Vec<String>),

    #[error(
        "Staged changes cannot be combined with path arguments. Commit the staged files on their own, or unstage them and pass paths."
    )]
    AmbiguousPathSelection,

    #[error("No changes to commit (working tree is clean)")]
    CleanTree,

    #[error("Path '{0}' is outside the repository working tree")]
    PathOutsideRepository(String),

    #[error("Failed to query repository: {0}")]
    QueryFailed(#[source] git2::Error),
}

/// Errors from read-only git queries used as optional context.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to resolve HEAD: {0}")]
    Head(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to read commit: {0}")]
    ParseCommit(#[source] git2::Error),
}

/// Errors from staging files and creating commits.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Cannot stage '{0}': it is neither in the working tree nor in the index")]
    UnknownPath(String),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Nothing to commit: {0} has no changes relative to HEAD")]
    EmptyCommit(String),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to read Claude output: {0}")]
    StreamFailed(#[source] std::io::Error),

    #[error("Claude produced no output for {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Codex CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to read Codex output: {0}")]
    StreamFailed(#[source] std::io::Error),

    #[error("Failed to write output schema file: {0}")]
    SchemaFile(#[source] std::io::Error),

    #[error("Codex produced no output for {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("Failed to create pull request: {0}")]
    CreatePullRequest(#[source] Box<octocrab::Error>),

    #[error("GitHub rejected the pull request: {0}")]
    PullRequestRejected(String),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Failed to parse repository URL")]
    InvalidRepositoryUrl,
}

/// Errors from reading an interactive confirmation.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read confirmation: {0}")]
    Interaction(String),

    #[error("Interrupted")]
    Interrupted,
}

/// Errors from the post-commit push and pull-request steps.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("{0}")]
    GitFailed(String),

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("Cannot publish from a detached HEAD")]
    DetachedHead,

    #[error("Remote '{0}' not found or has no URL")]
    MissingRemote(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Any fatal failure that ends a run with exit code 1.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Failed to apply \"{subject}\": {source}")]
    Apply {
        subject: String,
        #[source]
        source: CommitError,
    },

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl RunError {
    /// Whether the user interrupted an interactive prompt.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            RunError::Prompt(PromptError::Interrupted)
                | RunError::Publish(PublishError::Prompt(PromptError::Interrupted))
        )
    }
}
