//! taxis - A CLI tool that splits uncommitted changes into conventional commits.
//!
//! # Overview
//!
//! taxis collects the pending changes of a git working tree, asks a model CLI
//! (Claude Code or Codex) to group them into commits, and walks the user
//! through confirming each proposal. Accepted proposals are staged and
//! committed one at a time, in the order the model streams them.

pub mod claude;
pub mod codex;
pub mod collector;
pub mod commit;
pub mod context;
pub mod error;
pub mod git;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod publish;
pub mod report;

// Re-export commonly used types
pub use collector::{RepositoryState, collect_changes, open_repository, resolve_path_filters};
pub use commit::{AppliedCommit, DialoguerPrompter, Prompter};
pub use error::{
    ClaudeError, CodexError, CollectError, CommitError, GitError, GitHubError, PromptError,
    PublishError, RunError,
};
pub use llm::{CommitBatch, CommitProposal, CommitType, LlmError, ModelProvider, Provider, ProviderConfig};
pub use pipeline::{RunConfig, RunOutcome, Stage, run_pipeline};
