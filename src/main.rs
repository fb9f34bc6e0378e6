//! taxis - CLI entry point.

use std::panic::AssertUnwindSafe;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use futures::FutureExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taxis::git::history::history_count;
use taxis::llm::{provider_from_env, select_provider};
use taxis::report::Reporter;
use taxis::{
    DialoguerPrompter, LlmError, Provider, ProviderConfig, RunConfig, RunError, RunOutcome,
    open_repository, resolve_path_filters, run_pipeline,
};

/// Environment variable holding the tracing filter.
const LOG_ENV_VAR: &str = "TAXIS_LOG";

const INTERRUPTED_NOTICE: &str = "\nInterrupted, shutting down. Commits already created are kept.";

/// Split uncommitted changes into conventional commits proposed by an LLM.
#[derive(Parser, Debug)]
#[command(name = "taxis")]
#[command(about = "Split uncommitted changes into conventional commits proposed by an LLM")]
#[command(version)]
struct Cli {
    /// Only consider changes under these paths (default: whole working tree)
    paths: Vec<String>,

    /// Suppress progress output
    #[arg(short, long)]
    silent: bool,

    /// Accept every proposed commit without asking
    #[arg(short = 'y', long = "yes", visible_alias = "force", short_alias = 'f')]
    yes: bool,

    /// Send large prompts without asking for confirmation
    #[arg(long)]
    skip_token_check: bool,

    /// Push the current branch after committing
    #[arg(short, long)]
    push: bool,

    /// Offer to open a GitHub pull request after committing
    #[arg(long)]
    pr: bool,

    /// Format subjects with the Jira ticket found in the branch name
    #[arg(short, long)]
    jira: bool,

    /// Use the provider's deep-reasoning mode
    #[arg(short, long)]
    deep: bool,

    /// Include recent commit subjects as style context
    #[arg(short = 'H', long)]
    history: bool,

    /// Model CLI to use: claude or codex (default: first installed)
    #[arg(long)]
    provider: Option<Provider>,

    /// Show debug logs and full provider errors
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reporter = Reporter::new(cli.silent);
    let task = AssertUnwindSafe(run(&cli)).catch_unwind();

    // Signal handlers must be installed before the run blocks on a prompt.
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            eprintln!("{}", INTERRUPTED_NOTICE);
            ExitCode::SUCCESS
        }
        result = task => match result {
            Ok(Ok(_)) => ExitCode::SUCCESS,
            Ok(Err(e)) => report_failure(&e, cli.verbose, &reporter),
            Err(_) => {
                reporter.error("taxis hit an unexpected internal error");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let repo = open_repository(&cwd).map_err(RunError::from)?;

    let config = RunConfig {
        paths: resolve_path_filters(&repo, &cwd, &cli.paths).map_err(RunError::from)?,
        silent: cli.silent,
        auto_accept: cli.yes,
        skip_token_check: cli.skip_token_check,
        push: cli.push,
        pull_request: cli.pr,
        jira: cli.jira,
        history: cli.history.then(history_count),
    };

    let requested = cli.provider.or_else(provider_from_env);
    let deep = cli.deep;
    let choose = move || -> Result<ProviderConfig, LlmError> {
        let provider = select_provider(requested, |p| p.is_installed())?;
        Ok(ProviderConfig::for_provider(provider, deep))
    };

    let outcome = run_pipeline(&repo, &config, choose, &DialoguerPrompter).await?;
    Ok(outcome)
}

/// How a failed run is reported.
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    Interrupted,
    Fatal(String),
}

fn classify_failure(error: &anyhow::Error, verbose: bool) -> Failure {
    let Some(run_error) = error.downcast_ref::<RunError>() else {
        return Failure::Fatal(format!("{:#}", error));
    };
    if run_error.is_interrupted() {
        return Failure::Interrupted;
    }
    // RunError messages already carry their cause; the anyhow chain would repeat it.
    match run_error {
        RunError::Llm(llm) if verbose => Failure::Fatal(llm.detailed()),
        other => Failure::Fatal(other.to_string()),
    }
}

/// Print a fatal error and pick the exit code.
fn report_failure(error: &anyhow::Error, verbose: bool, reporter: &Reporter) -> ExitCode {
    match classify_failure(error, verbose) {
        Failure::Interrupted => {
            eprintln!("{}", INTERRUPTED_NOTICE);
            ExitCode::SUCCESS
        }
        Failure::Fatal(message) => {
            reporter.error(message);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,taxis=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time().with_target(false))
        .init();
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
