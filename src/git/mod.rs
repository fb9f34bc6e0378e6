//! Git operations using git2-rs.

pub mod branch;
pub mod diff;
pub mod history;
pub mod remote;
pub mod staging;
pub mod status;

pub use branch::{current_branch, extract_jira_ticket};
pub use diff::{DiffScope, DiffSummary, FileChange, FileStatus, collect_diff};
pub use history::recent_subjects;
pub use staging::{CommitSummary, GitVcs, Vcs, commit_paths, stage_paths};
pub use status::{WorkingTreeStatus, read_status};
