//! Interactive application of streamed commit proposals.

use dialoguer::Confirm;
use futures::StreamExt;
use tracing::debug;

use crate::commit::message::{format_message, format_subject};
use crate::commit::render::{render_applied, render_proposal};
use crate::error::{PromptError, RunError};
use crate::git::{CommitSummary, Vcs};
use crate::llm::{BatchStream, CommitBatch, CommitProposal};
use crate::pipeline::{Stage, enter_stage};
use crate::report::Reporter;

/// Source of yes/no answers.
///
/// This abstraction allows scripting confirmations in tests.
pub trait Prompter {
    fn confirm(&self, question: &str) -> Result<bool, PromptError>;
}

/// Terminal prompter. There is no default answer: the user must type y or n.
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn confirm(&self, question: &str) -> Result<bool, PromptError> {
        Confirm::new()
            .with_prompt(question)
            .interact()
            .map_err(|e| match e {
                dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
                    PromptError::Interrupted
                }
                other => PromptError::Interaction(other.to_string()),
            })
    }
}

/// A commit that was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCommit {
    pub subject: String,
    pub summary: CommitSummary,
}

/// Result of handling one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied(AppliedCommit),
    Skipped,
}

/// Walks proposals in stream order, confirming and committing each one.
pub struct CommitApplier<'a, V: Vcs, P: Prompter> {
    vcs: &'a V,
    prompter: &'a P,
    reporter: Reporter,
    auto_accept: bool,
    jira_ticket: Option<String>,
    applied: Vec<AppliedCommit>,
    skipped: usize,
}

impl<'a, V: Vcs, P: Prompter> CommitApplier<'a, V, P> {
    pub fn new(
        vcs: &'a V,
        prompter: &'a P,
        reporter: Reporter,
        auto_accept: bool,
        jira_ticket: Option<String>,
    ) -> Self {
        Self {
            vcs,
            prompter,
            reporter,
            auto_accept,
            jira_ticket,
            applied: Vec::new(),
            skipped: 0,
        }
    }

    /// Commits created so far, in order.
    pub fn applied(&self) -> &[AppliedCommit] {
        &self.applied
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_applied(self) -> Vec<AppliedCommit> {
        self.applied
    }

    /// Drain the stream, applying every batch as it arrives.
    ///
    /// Stops at the first stream or apply error. Commits already made stay.
    pub async fn apply_stream(&mut self, mut stream: BatchStream) -> Result<usize, RunError> {
        while let Some(batch) = stream.next().await {
            self.apply_batch(&batch?)?;
        }
        Ok(self.applied.len())
    }

    /// Apply each proposal of a batch in order.
    pub fn apply_batch(&mut self, batch: &CommitBatch) -> Result<(), RunError> {
        for proposal in &batch.commits {
            self.apply_proposal(proposal)?;
        }
        Ok(())
    }

    /// Render, confirm, and (if accepted) stage and commit one proposal.
    pub fn apply_proposal(&mut self, proposal: &CommitProposal) -> Result<CommitOutcome, RunError> {
        enter_stage(Stage::ConfirmingProposal);
        let jira = self.jira_ticket.as_deref();
        let subject = format_subject(proposal, jira);

        if !(self.reporter.is_silent() && self.auto_accept) {
            println!("{}", render_proposal(proposal, jira));
        }

        let accepted = self.auto_accept || self.prompter.confirm("Create this commit?")?;
        if !accepted {
            self.skipped += 1;
            self.reporter.info(format!("  [SKIP] {}", subject));
            return Ok(CommitOutcome::Skipped);
        }

        enter_stage(Stage::Applying);
        let apply_error = |source| RunError::Apply {
            subject: subject.clone(),
            source,
        };
        self.vcs.stage_files(&proposal.files).map_err(apply_error)?;
        let summary = self
            .vcs
            .commit_files(&format_message(proposal, jira), &proposal.files)
            .map_err(apply_error)?;

        debug!("Created commit {} for {} file(s)", summary.hash, proposal.files.len());
        self.reporter.info(render_applied(&subject, &summary));

        let applied = AppliedCommit { subject, summary };
        self.applied.push(applied.clone());
        Ok(CommitOutcome::Applied(applied))
    }
}
