//! The run state machine.
//!
//! `Collecting → BuildingPrompt → Streaming → {ConfirmingProposal ⇄ Applying}
//! → PostCommit → Done`. Any stage may fail the run by returning `Err`.

use git2::Repository;
use tracing::debug;

use crate::collector::collect_changes;
use crate::commit::{AppliedCommit, CommitApplier, Prompter};
use crate::context::{build_prompt, classify, estimate_tokens};
use crate::error::{CollectError, RunError};
use crate::git::{GitVcs, extract_jira_ticket};
use crate::llm::{LlmError, ModelProvider};
use crate::publish::{PublishOptions, publish};
use crate::report::Reporter;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    BuildingPrompt,
    Streaming,
    ConfirmingProposal,
    Applying,
    PostCommit,
    Done,
}

pub(crate) fn enter_stage(stage: Stage) {
    debug!("Stage: {:?}", stage);
}

/// Run-level settings, resolved from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Path filters; empty means the whole working tree.
    pub paths: Vec<String>,
    pub silent: bool,
    /// Accept every proposal without asking.
    pub auto_accept: bool,
    pub skip_token_check: bool,
    pub push: bool,
    pub pull_request: bool,
    /// Derive a Jira ticket from the branch name.
    pub jira: bool,
    /// Number of recent commit subjects to include, if any.
    pub history: Option<usize>,
}

/// How a run that did not fail ended. All of these exit 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The working tree had nothing to commit.
    NothingToDo,
    /// The user declined the token-cost confirmation.
    Declined,
    /// The stream ended; `commits` may be empty.
    Completed { commits: Vec<AppliedCommit> },
}

/// Drive one run to completion.
///
/// `select_provider` is only called once there is something to send, so a
/// clean tree never needs a model backend.
pub async fn run_pipeline<M, F, P>(
    repo: &Repository,
    config: &RunConfig,
    select_provider: F,
    prompter: &P,
) -> Result<RunOutcome, RunError>
where
    M: ModelProvider,
    F: FnOnce() -> Result<M, LlmError>,
    P: Prompter,
{
    let reporter = Reporter::new(config.silent);

    enter_stage(Stage::Collecting);
    let state = match collect_changes(repo, &config.paths, config.history) {
        Ok(state) => state,
        Err(CollectError::CleanTree) => {
            reporter.info("No changes to commit (working tree is clean)");
            return Ok(RunOutcome::NothingToDo);
        }
        Err(e) => return Err(e.into()),
    };
    reporter.info(format!(
        "Analyzing {} changed file(s) (+{} -{})",
        state.diff.files.len(),
        state.diff.insertions,
        state.diff.deletions
    ));

    let jira_ticket = if config.jira {
        let ticket = state.branch.as_deref().and_then(extract_jira_ticket);
        if ticket.is_none() {
            reporter.warn(format!(
                "No Jira ticket found in branch '{}'; using conventional commit messages",
                state.branch.as_deref().unwrap_or("HEAD")
            ));
        }
        ticket
    } else {
        None
    };

    enter_stage(Stage::BuildingPrompt);
    let prompt = build_prompt(&state, jira_ticket.as_deref());
    let tokens = estimate_tokens(&prompt.combined());
    let tier = classify(tokens);
    debug!("Estimated {} prompt tokens ({})", tokens, tier.level);

    if tier.needs_confirmation && !config.skip_token_check {
        reporter.warn(format!(
            "{} prompt: ~{} tokens. {}",
            tier.label, tokens, tier.description
        ));
        if !prompter.confirm("Send this prompt to the model?")? {
            reporter.info("Aborted; nothing was sent.");
            return Ok(RunOutcome::Declined);
        }
    }

    enter_stage(Stage::Streaming);
    let provider = select_provider()?;
    reporter.info(format!("Requesting commit proposals from {}...", provider.provider()));
    let stream = provider.stream_batches(&prompt);

    let vcs = GitVcs::new(repo);
    let mut applier = CommitApplier::new(
        &vcs,
        prompter,
        reporter,
        config.auto_accept,
        jira_ticket,
    );
    applier.apply_stream(stream).await?;
    let skipped = applier.skipped();
    let commits = applier.into_applied();

    print_summary(&reporter, &commits, skipped);

    if !commits.is_empty() {
        enter_stage(Stage::PostCommit);
        let options = PublishOptions {
            push: config.push,
            pull_request: config.pull_request,
            auto_accept: config.auto_accept,
        };
        publish(repo, &commits, options, prompter, &reporter).await?;
    }

    enter_stage(Stage::Done);
    Ok(RunOutcome::Completed { commits })
}

fn print_summary(reporter: &Reporter, commits: &[AppliedCommit], skipped: usize) {
    let mut line = format!(
        "Created {} commit{}",
        commits.len(),
        if commits.len() == 1 { "" } else { "s" }
    );
    if skipped > 0 {
        line.push_str(&format!(", skipped {}", skipped));
    }
    reporter.info(line);
    for commit in commits {
        reporter.info(format!("  {} {}", commit.summary.short_hash(), commit.subject));
    }
}
