//! Turning commit proposals into commits.

pub mod applier;
pub mod message;
pub mod render;

pub use applier::{AppliedCommit, CommitApplier, CommitOutcome, DialoguerPrompter, Prompter};
pub use message::{WRAP_WIDTH, format_message, format_subject, wrap_text};
pub use render::{render_applied, render_proposal};
