//! Errors of the model step.
//!
//! `Display` gives the one-line form shown by default; [`LlmError::detailed`]
//! adds the underlying cause for `--verbose`.

use thiserror::Error;

use crate::error::{ClaudeError, CodexError};
use crate::llm::router::{PROVIDER_ENV_VAR, Provider};

/// Raw output kept in detailed messages.
const DETAIL_OUTPUT_CHARS: usize = 500;

/// A provider subprocess failure.
#[derive(Error, Debug)]
pub enum LlmProviderError {
    #[error("{}", brief_claude(.0))]
    Claude(#[from] ClaudeError),

    #[error("{}", brief_codex(.0))]
    Codex(#[from] CodexError),
}

impl LlmProviderError {
    pub fn provider(&self) -> Provider {
        match self {
            LlmProviderError::Claude(_) => Provider::Claude,
            LlmProviderError::Codex(_) => Provider::Codex,
        }
    }

    /// Full message of the wrapped error, including stderr when present.
    pub fn detail(&self) -> String {
        match self {
            LlmProviderError::Claude(inner) => inner.to_string(),
            LlmProviderError::Codex(inner) => inner.to_string(),
        }
    }
}

/// Fatal failure of the model step. Ends the run with exit code 1.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Neither CLI is installed and none was requested.
    #[error("No LLM provider found. Install the Claude Code CLI or the Codex CLI.")]
    NoProviderAvailable,

    #[error("{name} failed: {0}", name = .0.provider())]
    ProviderFailed(#[from] LlmProviderError),

    #[error("{provider} returned unparseable output: {parse_error}")]
    ResponseParseFailed {
        provider: Provider,
        raw_output: String,
        parse_error: String,
    },
}

impl LlmError {
    /// One-line description for the terminal.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Description with the underlying cause, for `--verbose`.
    pub fn detailed(&self) -> String {
        match self {
            LlmError::NoProviderAvailable => format!(
                "{self} Looked for `claude` and `codex` on PATH; set {PROVIDER_ENV_VAR} to force one."
            ),
            LlmError::ProviderFailed(inner) => {
                format!("{} failed: {}", inner.provider(), inner.detail())
            }
            LlmError::ResponseParseFailed {
                provider,
                raw_output,
                parse_error,
            } => {
                let excerpt: String = raw_output.chars().take(DETAIL_OUTPUT_CHARS).collect();
                format!("{provider} returned unparseable output ({parse_error}). Output began: {excerpt}")
            }
        }
    }
}

impl From<ClaudeError> for LlmError {
    fn from(err: ClaudeError) -> Self {
        LlmError::ProviderFailed(err.into())
    }
}

impl From<CodexError> for LlmError {
    fn from(err: CodexError) -> Self {
        LlmError::ProviderFailed(err.into())
    }
}

fn brief_claude(err: &ClaudeError) -> String {
    match err {
        ClaudeError::NotInstalled => "`claude` is not on PATH".into(),
        ClaudeError::ExecutionFailed(msg) => format!("the CLI reported: {msg}"),
        ClaudeError::SpawnFailed(_) => "could not start `claude`".into(),
        ClaudeError::StreamFailed(_) => "output stream broke off".into(),
        ClaudeError::Timeout(secs) => format!("no output for {secs}s"),
        ClaudeError::NonZeroExit { code, .. } => format!("`claude` exited with code {code}"),
    }
}

fn brief_codex(err: &CodexError) -> String {
    match err {
        CodexError::NotInstalled => "`codex` is not on PATH".into(),
        CodexError::ExecutionFailed(msg) => format!("the CLI reported: {msg}"),
        CodexError::SpawnFailed(_) => "could not start `codex`".into(),
        CodexError::StreamFailed(_) => "output stream broke off".into(),
        CodexError::SchemaFile(_) => "could not write the output schema file".into(),
        CodexError::Timeout(secs) => format!("no output for {secs}s"),
        CodexError::NonZeroExit { code, .. } => format!("`codex` exited with code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_names_provider_and_hides_stderr() {
        let err = LlmError::from(ClaudeError::NonZeroExit {
            code: 2,
            stderr: "rate limited".to_string(),
        });
        assert_eq!(err.summary(), "Claude failed: `claude` exited with code 2");
        assert!(!err.summary().contains("rate limited"));
        assert!(err.detailed().contains("rate limited"));
    }

    #[test]
    fn codex_failures_are_attributed_to_codex() {
        let err = LlmError::from(CodexError::NotInstalled);
        assert_eq!(err.summary(), "Codex failed: `codex` is not on PATH");
        assert!(matches!(&err, LlmError::ProviderFailed(p) if p.provider() == Provider::Codex));
    }

    #[test]
    fn parse_failure_detail_is_truncated() {
        let err = LlmError::ResponseParseFailed {
            provider: Provider::Claude,
            raw_output: "x".repeat(2_000),
            parse_error: "no JSON array found in output".to_string(),
        };
        assert!(err.summary().contains("no JSON array"));
        assert!(err.detailed().chars().filter(|c| *c == 'x').count() <= DETAIL_OUTPUT_CHARS);
    }

    #[test]
    fn missing_provider_detail_mentions_override() {
        let detail = LlmError::NoProviderAvailable.detailed();
        assert!(detail.contains(PROVIDER_ENV_VAR));
    }
}
